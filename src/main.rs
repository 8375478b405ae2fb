mod cli;
mod commands;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use shelf_config::Config;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code of a restore that ran to the end but left novels out.
const EXIT_PARTIAL: u8 = 2;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("SHELF_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn load_config(path: Option<&Path>, database: Option<PathBuf>) -> Result<Config> {
    let mut config = shelf_config::load(path).or_raise(|| ErrorKind::Config)?;
    if let Some(database) = database {
        config.database.path = database;
    }
    tracing::debug!(database = %config.database.path.display(), "configuration loaded");
    Ok(config)
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Inspect { archive } => {
            commands::run_inspect(&archive).await?;
            Ok(ExitCode::SUCCESS)
        },
        Command::Export { output } => {
            let config = load_config(cli.config.as_deref(), cli.database)?;
            commands::run_export(&config, output).await?;
            Ok(ExitCode::SUCCESS)
        },
        Command::Restore { archive, catalog } => {
            let config = load_config(cli.config.as_deref(), cli.database)?;
            let summary = commands::run_restore(&config, &archive, catalog.as_deref()).await?;
            Ok(match summary.is_complete() {
                true => ExitCode::SUCCESS,
                false => ExitCode::from(EXIT_PARTIAL),
            })
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}
