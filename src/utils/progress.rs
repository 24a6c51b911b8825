use indicatif::{ProgressBar, ProgressStyle};

/// Bar over input files; hidden when stdout carries machine output.
pub fn file_progress(total: u64, visible: bool) -> ProgressBar {
    if !visible || total <= 1 {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(total);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner:.cyan} checking [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
