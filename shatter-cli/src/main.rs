//! shatter CLI - Command-line job runner
//!
//! This binary drives the shatter library: it loads the INI configuration,
//! sets up logging and runs a decomposition job over the grid, or prints
//! the output table DDL.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::run::RunArgs;
use commands::schema::SchemaArgs;

#[derive(Parser)]
#[command(name = "shatter")]
#[command(version = shatter::VERSION)]
#[command(about = "Decompose grid cells into non-overlapping tagged shards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a decomposition job over the grid
    Run {
        /// Configuration file (default: ~/.shatter/config.ini)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Comma separated list of cell ids to process instead of the whole grid
        #[arg(long, conflicts_with = "rerun_ledger")]
        cells: Option<String>,

        /// Rerun only the cells recorded in the failure ledger.
        ///
        /// The ledger is rotated aside before the run starts, so cells
        /// that fail again are recorded in a fresh file.
        #[arg(long)]
        rerun_ledger: bool,

        /// Override the configured worker count
        #[arg(long, short)]
        workers: Option<usize>,

        /// Enable debug logging regardless of RUST_LOG
        #[arg(long)]
        debug: bool,

        /// Only log to the job log file
        #[arg(long)]
        no_stdout: bool,
    },

    /// Print the DDL of the output table for the negotiated layer schema
    Schema {
        /// Configuration file (default: ~/.shatter/config.ini)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Execute the DDL against the store instead of printing it
        #[arg(long)]
        apply: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            cells,
            rerun_ledger,
            workers,
            debug,
            no_stdout,
        } => commands::run::run(RunArgs {
            config,
            cells,
            rerun_ledger,
            workers,
            debug,
            no_stdout,
        }),
        Commands::Schema { config, apply } => {
            commands::schema::run(SchemaArgs { config, apply })
        }
    };

    if let Err(e) = result {
        e.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_cells() {
        let cli = Cli::try_parse_from(["shatter", "run", "--cells", "18,19", "--debug"]).unwrap();
        match cli.command {
            Commands::Run {
                cells,
                debug,
                rerun_ledger,
                ..
            } => {
                assert_eq!(cells.as_deref(), Some("18,19"));
                assert!(debug);
                assert!(!rerun_ledger);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_cells_conflicts_with_rerun_ledger() {
        let result = Cli::try_parse_from(["shatter", "run", "--cells", "1", "--rerun-ledger"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_schema_apply() {
        let cli =
            Cli::try_parse_from(["shatter", "schema", "--config", "job.ini", "--apply"]).unwrap();
        match cli.command {
            Commands::Schema { config, apply } => {
                assert_eq!(config, Some(PathBuf::from("job.ini")));
                assert!(apply);
            }
            _ => panic!("expected schema"),
        }
    }
}
