//! Job-wide statistics.
//!
//! Workers update a shared [`JobStats`] with atomic counters as cells finish;
//! the orchestrator turns it into a [`JobSummary`] once every worker has
//! joined.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::model::CellId;
use crate::pipeline::CellOutcome;

/// Lifecycle of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl CellState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CellState::Completed | CellState::Failed)
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CellState::Pending => "pending",
            CellState::Running => "running",
            CellState::Completed => "completed",
            CellState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Thread-safe counters shared by all workers.
///
/// # Example
///
/// ```
/// use shatter::orchestrator::JobStats;
/// use shatter::pipeline::CellOutcome;
///
/// let stats = JobStats::new();
/// stats.record_completed(&CellOutcome { cell_id: 1, records: 4, ..Default::default() });
/// stats.record_failed();
///
/// let summary = stats.summary(vec![2]);
/// assert_eq!(summary.completed, 1);
/// assert_eq!(summary.failed, 1);
/// assert_eq!(summary.records, 4);
/// ```
#[derive(Debug)]
pub struct JobStats {
    completed: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
    shards: AtomicU64,
    records: AtomicU64,
    started: Instant,
}

impl Default for JobStats {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStats {
    pub fn new() -> Self {
        Self {
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            shards: AtomicU64::new(0),
            records: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_completed(&self, outcome: &CellOutcome) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.discarded
            .fetch_add(outcome.discarded as u64, Ordering::Relaxed);
        self.shards.fetch_add(outcome.shards as u64, Ordering::Relaxed);
        self.records.fetch_add(outcome.records as u64, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Cells finished so far, either way.
    pub fn finished(&self) -> u64 {
        self.completed.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }

    /// Freeze the counters into a summary.
    pub fn summary(&self, mut failed_cells: Vec<CellId>) -> JobSummary {
        failed_cells.sort_unstable();
        JobSummary {
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            shards: self.shards.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
            failed_cells,
        }
    }
}

/// Final account of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub completed: u64,
    pub failed: u64,
    /// Candidates discarded for invalid rings, over all completed cells
    pub discarded: u64,
    pub shards: u64,
    pub records: u64,
    pub elapsed: Duration,
    /// Sorted ids of failed cells
    pub failed_cells: Vec<CellId>,
}

impl JobSummary {
    pub fn total(&self) -> u64 {
        self.completed + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} cells completed, {} failed; {} shards, {} records written, \
             {} candidates discarded in {:.1}s",
            self.completed,
            self.total(),
            self.failed,
            self.shards,
            self.records,
            self.discarded,
            self.elapsed.as_secs_f64()
        )
    }
}
