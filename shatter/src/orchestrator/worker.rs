//! Worker loop: one thread, one contiguous chunk of cells.

use std::panic::{self, AssertUnwindSafe};

use super::ledger::FailureLedger;
use super::stats::{CellState, JobStats};
use crate::log::WorkerLogger;
use crate::model::{CellId, LayerSchema};
use crate::panic::{payload_message, take_last_panic};
use crate::pipeline::{process_cell, CellError, CellOutcome, PipelineConfig, StageTimings};
use crate::store::ConnectionFactory;
use crate::{log_debug, log_error, log_info};

/// Read-only state every worker borrows for the lifetime of the job.
pub(super) struct WorkerShared<'a> {
    pub factory: &'a dyn ConnectionFactory,
    pub pipeline: &'a PipelineConfig,
    pub schema: &'a LayerSchema,
    pub ledger: &'a FailureLedger,
    pub stats: &'a JobStats,
}

/// Process `cells` in order; returns the ids that failed.
///
/// A failing cell is logged, appended to the ledger and skipped. Nothing a
/// cell does (error or panic) stops the loop.
pub(super) fn run_worker(
    shared: &WorkerShared<'_>,
    logger: &WorkerLogger,
    cells: &[CellId],
) -> Vec<CellId> {
    log_info!(logger, "starting with {} cell(s)", cells.len());

    let mut failed = Vec::new();
    for &cell_id in cells {
        log_debug!(logger, "cell {}: {}", cell_id, CellState::Running);

        let mut timings = StageTimings::new();
        let result = run_isolated(shared, logger, cell_id, &mut timings);
        let slowest = timings
            .slowest()
            .map(|(stage, elapsed)| format!("{} ({}ms)", stage, elapsed.as_millis()))
            .unwrap_or_else(|| "none".to_string());

        match result {
            Ok(outcome) => {
                shared.stats.record_completed(&outcome);
                log_info!(
                    logger,
                    "cell {}: {} candidates={} discarded={} shards={} records={} | {} | slowest={}",
                    cell_id,
                    CellState::Completed,
                    outcome.candidates,
                    outcome.discarded,
                    outcome.shards,
                    outcome.records,
                    timings,
                    slowest
                );
            }
            Err(error) => {
                shared.stats.record_failed();
                failed.push(cell_id);
                log_error!(
                    logger,
                    "cell {}: {} [{}] {} | {} | slowest={}",
                    cell_id,
                    CellState::Failed,
                    error.kind(),
                    error,
                    timings,
                    slowest
                );
                if let Err(e) = shared.ledger.record(cell_id) {
                    log_error!(
                        logger,
                        "cell {}: could not append to ledger {}: {}",
                        cell_id,
                        shared.ledger.path().display(),
                        e
                    );
                }
            }
        }
    }

    log_info!(
        logger,
        "finished: {} completed, {} failed",
        cells.len() - failed.len(),
        failed.len()
    );
    failed
}

/// Run one cell on its own connection, turning a panic into a cell error.
/// The connection is dropped when the closure exits, however it exits.
fn run_isolated(
    shared: &WorkerShared<'_>,
    logger: &WorkerLogger,
    cell_id: CellId,
    timings: &mut StageTimings,
) -> Result<CellOutcome, CellError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| -> Result<CellOutcome, CellError> {
        let mut conn = shared.factory.connect()?;
        process_cell(
            cell_id,
            conn.as_mut(),
            shared.pipeline,
            shared.schema,
            logger,
            timings,
        )
    }));

    match result {
        Ok(result) => result,
        Err(payload) => Err(CellError::Panicked(
            take_last_panic().unwrap_or_else(|| payload_message(&*payload)),
        )),
    }
}
