use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "csscompat",
    version,
    about = "Cross-browser support scores for the CSS properties a project uses"
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Score a .css/.vue file or every such file under a directory
    Check(CheckArgs),
    /// Write a default csscompat.toml in the current directory
    Init(InitArgs),
    Data {
        #[command(subcommand)]
        command: DataSubcommand,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CheckArgs {
    #[arg(long, default_value = ".")]
    pub path: PathBuf,
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub json: bool,
    /// Where to write the JSON results file
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Comma-separated browser list, replaces [browsers].tracked
    #[arg(long, value_delimiter = ',')]
    pub browsers: Vec<String>,
    /// Consolidated MDN dataset, replaces [data].mdn_path
    #[arg(long)]
    pub mdn: Option<PathBuf>,
    /// Local caniuse data.json instead of downloading it
    #[arg(long)]
    pub caniuse: Option<PathBuf>,
    #[arg(long)]
    pub min_score: Option<f64>,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum DataSubcommand {
    /// Build the consolidated MDN dataset
    Sync(SyncArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SyncArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Normalize an existing css/properties directory instead of cloning
    #[arg(long)]
    pub from: Option<PathBuf>,
    #[arg(long)]
    pub repo: Option<String>,
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_browser_list_and_offline_data() {
        let cli = Cli::parse_from([
            "csscompat",
            "check",
            "--path",
            "src",
            "--browsers",
            "chrome,firefox",
            "--caniuse",
            "data.json",
        ]);
        let Commands::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.browsers, vec!["chrome", "firefox"]);
        assert_eq!(args.caniuse, Some(PathBuf::from("data.json")));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn parses_data_sync() {
        let cli = Cli::parse_from(["csscompat", "data", "sync", "--from", "props"]);
        assert!(matches!(
            cli.command,
            Commands::Data {
                command: DataSubcommand::Sync(SyncArgs { from: Some(_), .. })
            }
        ));
    }
}
