pub mod dataset;
pub mod error;
pub mod report;
pub mod resolver;
pub mod scanner;
pub mod score;

use crate::config::{Config, ScanConfig};
use crate::core::error::CompatError;
use crate::core::report::CompatibilityReport;
use crate::core::resolver::SupportResolver;
use crate::core::scanner::SourceKind;
use crate::core::score::AggregateScores;
use crate::sources::Datasets;
use crate::utils::fs as fs_utils;
use crate::utils::progress;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub path: PathBuf,
    pub kind: SourceKind,
}

/// A single file, or every supported file under a directory in name order.
pub fn collect_inputs(input: &Path, cfg: &ScanConfig) -> Result<Vec<InputFile>> {
    if !input.exists() {
        bail!("path does not exist: {}", input.display());
    }

    if input.is_file() {
        return match supported_kind(input, cfg) {
            Some(kind) => Ok(vec![InputFile {
                path: input.to_path_buf(),
                kind,
            }]),
            None => bail!(
                "unsupported file type: {} (expected one of: {})",
                input.display(),
                cfg.extensions.join(", ")
            ),
        };
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| fs_utils::should_visit(entry, &cfg.exclude))
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(kind) = supported_kind(entry.path(), cfg) {
            inputs.push(InputFile {
                path: entry.into_path(),
                kind,
            });
        }
    }

    debug!(files = inputs.len(), root = %input.display(), "collected input files");
    Ok(inputs)
}

fn supported_kind(path: &Path, cfg: &ScanConfig) -> Option<SourceKind> {
    SourceKind::from_path(path).filter(|kind| cfg.allows_extension(kind.extension()))
}

pub fn evaluate_file(
    input: &InputFile,
    resolver: &SupportResolver<'_>,
    cfg: &Config,
) -> Result<AggregateScores> {
    let max_bytes = cfg.scan.max_file_size_kb * 1024;
    let properties = scanner::extract_from_file(&input.path, input.kind, max_bytes)?;
    debug!(
        file = %input.path.display(),
        properties = properties.len(),
        "extracted properties"
    );

    Ok(score::aggregate(
        &properties,
        resolver,
        &cfg.browsers.tracked,
        cfg.general.top_offenders,
    ))
}

/// Scores every input against the shared datasets.
///
/// Per-file problems are logged and the file is skipped; only fatal
/// dataset errors stop the run.
pub fn run_evaluation(
    inputs: &[InputFile],
    datasets: &Datasets,
    cfg: &Config,
    show_progress: bool,
) -> Result<CompatibilityReport> {
    let resolver = SupportResolver::new(&datasets.primary, &datasets.secondary);
    let mut report = CompatibilityReport::default();
    let bar = progress::file_progress(inputs.len() as u64, show_progress);

    for input in inputs {
        bar.set_message(fs_utils::tail_key(&input.path));
        let outcome = bar.suspend(|| {
            evaluate_file(input, &resolver, cfg).map(|scores| report.insert(&input.path, scores))
        });
        if let Err(err) = outcome {
            if err
                .downcast_ref::<CompatError>()
                .is_some_and(CompatError::is_fatal)
            {
                bar.finish_and_clear();
                return Err(err);
            }
            bar.suspend(|| warn!("{err:#}"));
        }
        bar.inc(1);
    }

    bar.finish_and_clear();
    Ok(report)
}
