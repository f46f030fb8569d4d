//! Parallel job orchestration.
//!
//! The cell list is split into contiguous chunks before dispatch, one per
//! worker thread. Each worker owns its logger handle and opens a fresh
//! store connection for every cell. The only state shared between workers
//! is read-only configuration, the connection factory, the atomic job
//! counters and the mutex-guarded failure ledger.
//!
//! Per cell: `pending -> running -> completed | failed`. The job is done
//! when every worker has joined.

mod job;
mod ledger;
mod partition;
mod selection;
mod stats;
mod worker;

pub use job::{negotiate_schema, open_factory, run_job, JobConfig, JobError};
pub use ledger::{read_ledger, rotate_ledger, FailureLedger};
pub use partition::partition;
pub use selection::{parse_cell_list, CellSelection};
pub use stats::{CellState, JobStats, JobSummary};
