//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes: 1 for anything that stopped the job, 2 when
//! the job ran to the end but some cells failed.

use std::fmt;
use std::path::PathBuf;
use std::process;
use shatter::config::ConfigFileError;
use shatter::orchestrator::JobError;
use shatter::store::StoreError;

/// Exit status for a job that finished with failed cells.
pub const EXIT_PARTIAL_FAILURE: i32 = 2;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration file missing or invalid
    Config(ConfigFileError),
    /// Bad command-line argument
    InvalidArgument(String),
    /// Job setup failed before any cell ran
    Job(JobError),
    /// Store error outside a job (schema command)
    Store(StoreError),
    /// The job finished but some cells failed
    PartialFailure { failed: u64, ledger: PathBuf },
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::PartialFailure { .. } => EXIT_PARTIAL_FAILURE,
            _ => 1,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Config(ConfigFileError::NotFound(path)) => {
                eprintln!();
                eprintln!("Create a configuration file at {}", path.display());
                eprintln!("or pass one explicitly with --config <PATH>.");
            }
            CliError::Job(JobError::Store(StoreError::Connection(_))) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Database not reachable: check [store] url in the config");
                eprintln!("  2. PostGIS extension missing: CREATE EXTENSION postgis");
            }
            CliError::PartialFailure { ledger, .. } => {
                eprintln!();
                eprintln!("Failed cell ids were appended to {}", ledger.display());
                eprintln!("Rerun them with: shatter run --rerun-ledger");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Job(e) => write!(f, "Job aborted: {}", e),
            CliError::Store(e) => write!(f, "Store error: {}", e),
            CliError::PartialFailure { failed, .. } => {
                write!(f, "{} cell(s) failed", failed)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::Job(e) => Some(e),
            CliError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<JobError> for CliError {
    fn from(e: JobError) -> Self {
        CliError::Job(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}
