use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Back up and restore a shelf library.
#[derive(Debug, Parser)]
#[command(name = "shelf", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log debug output (overridden by `SHELF_LOG`)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file layered over the user configuration
    #[arg(short, long, global = true, env = "SHELF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Library database, overriding the configured one
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write every bookmarked novel and what it depends on to an archive
    Export {
        /// Archive to write; defaults to a timestamped file in the backup
        /// directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Merge an archive into the library
    Restore {
        archive: PathBuf,

        /// JSON list of the extensions the configured repositories advertise
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Describe an archive without touching the library
    Inspect { archive: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_restore() {
        let cli = Cli::try_parse_from(["shelf", "-v", "restore", "backup.sbk", "--catalog", "cat.json"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Restore { archive, catalog } => {
                assert_eq!(archive, PathBuf::from("backup.sbk"));
                assert_eq!(catalog, Some(PathBuf::from("cat.json")));
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_inspect_requires_archive() {
        assert!(Cli::try_parse_from(["shelf", "inspect"]).is_err());
    }
}
