//! Run command - decompose the selected cells of the grid.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shatter::log::TracingLogger;
use shatter::model::CellId;
use shatter::orchestrator::{open_factory, parse_cell_list, run_job, CellSelection, JobConfig};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the run command.
#[derive(Debug, Default)]
pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub cells: Option<String>,
    pub rerun_ledger: bool,
    pub workers: Option<usize>,
    pub debug: bool,
    pub no_stdout: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    // Parse cheap arguments before touching the log file
    let explicit = args
        .cells
        .as_deref()
        .map(parse_cell_list)
        .transpose()
        .map_err(CliError::InvalidArgument)?;
    if args.workers == Some(0) {
        return Err(CliError::InvalidArgument(
            "--workers must be at least 1".to_string(),
        ));
    }

    let mut runner = CliRunner::new(args.config.as_deref(), !args.no_stdout, args.debug)?;
    runner.log_startup("run");
    if let Some(workers) = args.workers {
        runner.config_mut().workers.count = workers;
    }
    let config = runner.config();

    let selection = select_cells(explicit, args.rerun_ledger, &config.ledger.path);
    let job = JobConfig::from_config(config, selection);
    let factory = open_factory(config)?;

    let summary = run_job(&job, factory.as_ref(), Arc::new(TracingLogger))?;

    println!();
    println!("{}", summary);
    if summary.has_failures() {
        return Err(CliError::PartialFailure {
            failed: summary.failed,
            ledger: config.ledger.path.clone(),
        });
    }
    Ok(())
}

fn select_cells(explicit: Option<Vec<CellId>>, rerun_ledger: bool, ledger: &Path) -> CellSelection {
    match (explicit, rerun_ledger) {
        (Some(ids), _) => CellSelection::Explicit(ids),
        (None, true) => CellSelection::Ledger(ledger.to_path_buf()),
        (None, false) => CellSelection::All,
    }
}
