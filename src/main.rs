mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{CheckArgs, Cli, Commands, DataSubcommand, SyncArgs};
use csscompat::config;
use csscompat::core::report::{evaluate_exit, print_human};
use csscompat::core::{self as compat, score::TrackedBrowsers};
use csscompat::sources::{Datasets, mdn};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    };

    std::process::exit(exit_code);
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Init(args) => {
            if args.config.is_some() {
                eprintln!(
                    "warning: --config is ignored by `csscompat init`; writing ./{}",
                    config::CONFIG_FILE_NAME
                );
            }

            let path = std::env::current_dir()?.join(config::CONFIG_FILE_NAME);
            config::write_default_config(&path)?;
            println!("created {}", path.display());
            Ok(0)
        }
        Commands::Data { command } => match command {
            DataSubcommand::Sync(args) => run_sync(args),
        },
    }
}

fn run_check(args: CheckArgs) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    let mut cfg = config::load_config(args.config.as_deref(), &cwd)?.config;

    if !args.browsers.is_empty() {
        cfg.browsers.tracked = TrackedBrowsers::new(&args.browsers)?;
    }
    if let Some(path) = &args.mdn {
        cfg.data.mdn_path = path.to_string_lossy().into_owned();
    }
    if let Some(path) = &args.caniuse {
        cfg.data.caniuse_path = Some(path.to_string_lossy().into_owned());
    }
    if let Some(min_score) = args.min_score {
        cfg.general.min_score = min_score;
    }

    let inputs = compat::collect_inputs(&args.path, &cfg.scan)?;
    let datasets = Datasets::load(&cfg, &cwd)?;

    let output_json = args.json || cfg.general.json;
    let report = compat::run_evaluation(&inputs, &datasets, &cfg, !output_json)?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&cfg.general.output));
    report.write_json(&output)?;

    let exit = evaluate_exit(&report, cfg.general.min_score);
    if output_json {
        println!("{}", report.to_json()?);
    } else {
        print_human(&report, &exit);
        println!("results written to {}", output.display());
    }

    if exit.ok { Ok(0) } else { Ok(1) }
}

fn run_sync(args: SyncArgs) -> Result<i32> {
    let cwd = std::env::current_dir()?;
    let cfg = config::load_config(args.config.as_deref(), &cwd)?.config;
    let output = args
        .output
        .unwrap_or_else(|| cwd.join(&cfg.data.mdn_path));

    let summary = match &args.from {
        Some(dir) => mdn::sync_from_dir(dir, &output)?,
        None => {
            let repo = args.repo.as_deref().unwrap_or(&cfg.data.mdn_repo);
            mdn::sync_from_repo(
                repo,
                &cfg.data.mdn_properties_dir,
                cfg.data.clone_depth,
                &output,
            )?
        }
    };

    match &summary.commit {
        Some(commit) => println!(
            "saved {} properties to {} (browser-compat-data {})",
            summary.properties,
            summary.output.display(),
            &commit[..commit.len().min(12)]
        ),
        None => println!(
            "saved {} properties to {}",
            summary.properties,
            summary.output.display()
        ),
    }
    Ok(0)
}
