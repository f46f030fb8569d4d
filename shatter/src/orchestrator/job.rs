//! Job setup and the worker pool.
//!
//! Setup runs on the calling thread and any error there aborts the job:
//! the layer schema is negotiated, the output is prepared and the cell
//! list resolved before a single worker starts. After that only per-cell
//! failures are possible, and they never abort.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use thiserror::Error;

use super::ledger::FailureLedger;
use super::partition::partition;
use super::selection::CellSelection;
use super::stats::{JobStats, JobSummary};
use super::worker::{run_worker, WorkerShared};
use crate::config::{ConfigFile, ConfigFileError};
use crate::log::{Logger, WorkerLogger};
use crate::model::{CellId, LayerSchema};
use crate::pipeline::PipelineConfig;
use crate::store::{
    ConnectionFactory, FileStoreFactory, PostgisFactory, PostgisTables, StoreBackend,
    StoreConnection, StoreError,
};
use crate::{log_error, log_info, log_warn};

/// Errors that abort a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigFileError),

    #[error("job setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("failure ledger {}: {source}", path.display())]
    Ledger {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {0} panicked outside a cell")]
    WorkerPanicked(usize),
}

/// Everything a job run needs besides the connection factory.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub workers: usize,
    pub pipeline: PipelineConfig,
    /// Explicit layer schema; empty means use the candidate source's layers
    pub layer_tags: Vec<String>,
    pub ledger_path: PathBuf,
    pub selection: CellSelection,
}

impl JobConfig {
    pub fn from_config(config: &ConfigFile, selection: CellSelection) -> Self {
        Self {
            workers: config.workers.count,
            pipeline: PipelineConfig::from(config),
            layer_tags: config.layers.tags.clone(),
            ledger_path: config.ledger.path.clone(),
            selection,
        }
    }
}

/// Build the connection factory for the configured backend.
pub fn open_factory(config: &ConfigFile) -> Result<Box<dyn ConnectionFactory>, JobError> {
    let grid = config
        .grid
        .source
        .clone()
        .ok_or(StoreError::MissingSetting("grid.source"))?;
    let candidates = config
        .candidates
        .source_table
        .clone()
        .ok_or(StoreError::MissingSetting("candidates.source_table"))?;

    match config.store.backend {
        StoreBackend::Postgis => {
            let url = config
                .store
                .url
                .clone()
                .ok_or(StoreError::MissingSetting("store.url"))?;
            let tables = PostgisTables {
                grid_table: grid,
                candidate_table: candidates,
                output_schema: config.output.schema.clone(),
                output_table: config.output.table.clone(),
                srid: config.output.srid,
            };
            Ok(Box::new(PostgisFactory::new(url, tables)?))
        }
        StoreBackend::File => Ok(Box::new(FileStoreFactory::open(
            grid,
            candidates,
            &config.output.directory,
        )?)),
    }
}

/// Fix the presence-flag columns: the explicit list if one is configured,
/// otherwise every distinct layer of the candidate source.
pub fn negotiate_schema(
    explicit: &[String],
    conn: &mut dyn StoreConnection,
) -> Result<LayerSchema, StoreError> {
    if !explicit.is_empty() {
        return Ok(LayerSchema::new(explicit.iter().cloned()));
    }
    Ok(LayerSchema::new(conn.distinct_layers()?))
}

/// Run a whole job and return its summary.
///
/// Returns `Err` only for setup failures. A job where cells failed still
/// returns `Ok`; check [`JobSummary::has_failures`].
pub fn run_job(
    config: &JobConfig,
    factory: &dyn ConnectionFactory,
    logger: Arc<dyn Logger>,
) -> Result<JobSummary, JobError> {
    crate::panic::init();
    log_info!(
        logger,
        "job starting: {} with {} worker(s)",
        factory.describe(),
        config.workers
    );

    let (schema, cell_ids) = {
        let mut conn = factory.connect()?;
        let schema = negotiate_schema(&config.layer_tags, conn.as_mut())?;
        conn.prepare_output(&schema)?;
        let ids = config.selection.resolve(conn.as_mut())?;
        (schema, ids)
    };
    log_info!(logger, "layer schema: [{}]", schema.tags().join(", "));

    let ledger = FailureLedger::open(&config.ledger_path).map_err(|source| JobError::Ledger {
        path: config.ledger_path.clone(),
        source,
    })?;

    let stats = JobStats::new();
    let chunks = partition(&cell_ids, config.workers);
    log_info!(
        logger,
        "dispatching {} cell(s) to {} worker(s)",
        cell_ids.len(),
        chunks.len()
    );

    let shared = WorkerShared {
        factory,
        pipeline: &config.pipeline,
        schema: &schema,
        ledger: &ledger,
        stats: &stats,
    };

    let failed_cells = thread::scope(|scope| -> Result<Vec<CellId>, JobError> {
        let mut handles = Vec::with_capacity(chunks.len());
        for (worker, cells) in chunks.iter().enumerate() {
            let worker_logger = WorkerLogger::new(worker, Arc::clone(&logger));
            let shared = &shared;
            let handle = thread::Builder::new()
                .name(format!("shatter-worker-{}", worker))
                .spawn_scoped(scope, move || run_worker(shared, &worker_logger, cells))
                .map_err(|source| JobError::Spawn { worker, source })?;
            handles.push((worker, handle));
        }

        let mut failed = Vec::new();
        let mut panicked = None;
        for (worker, handle) in handles {
            match handle.join() {
                Ok(ids) => failed.extend(ids),
                Err(_) => {
                    log_error!(logger, "worker {} panicked outside a cell", worker);
                    panicked.get_or_insert(worker);
                }
            }
        }
        match panicked {
            Some(worker) => Err(JobError::WorkerPanicked(worker)),
            None => Ok(failed),
        }
    })?;

    let summary = stats.summary(failed_cells);
    if summary.has_failures() {
        log_warn!(
            logger,
            "{} cell(s) failed; ids appended to {}",
            summary.failed,
            ledger.path().display()
        );
    }
    log_info!(logger, "job done: {}", summary);
    Ok(summary)
}
