use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{ArgAction, Parser};
use log::{LevelFilter, error, info};
use luapack::{config::Config, orchestrator::BundleOrchestrator};

#[derive(Parser, Debug)]
#[command(name = "luapack")]
#[command(about = "Bundle Lua scripts and their required modules into single files")]
#[command(version)]
struct Cli {
    /// Entry scripts, relative to the source directory. Defaults to every
    /// .lua file directly inside it.
    entries: Vec<String>,

    /// Directory containing entry scripts and modules
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Directory bundles are written to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file layered over user and project config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mixin module to inject at the extension point (repeatable). Defaults
    /// to every module in the mixin directory.
    #[arg(short, long = "mixin")]
    mixins: Vec<String>,

    /// Keep comments and blank lines in the output
    #[arg(long)]
    no_strip_comments: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(source) = cli.source {
        config.source_dir = source;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if cli.no_strip_comments {
        config.strip_comments = false;
    }

    let mixins = (!cli.mixins.is_empty()).then_some(cli.mixins);
    let mut orchestrator = BundleOrchestrator::new(config);
    let summary = orchestrator.run(&cli.entries, mixins)?;

    info!(
        "Wrote {} bundles ({} modules resolved)",
        summary.bundles.len(),
        orchestrator.cache().len()
    );

    if summary.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!(
            "{} unresolvable imports; bundles were written without them",
            summary.unresolved.len()
        );
        Ok(ExitCode::FAILURE)
    }
}
