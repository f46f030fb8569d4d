//! Per-worker logger handle.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;
use std::sync::Arc;

/// Logger handle owned by one worker thread.
///
/// Built once when the worker starts and passed by reference into every
/// pipeline stage, so a line can always be attributed to its worker even
/// though all workers share the same backend.
#[derive(Clone)]
pub struct WorkerLogger {
    worker: usize,
    inner: Arc<dyn Logger>,
}

impl WorkerLogger {
    pub fn new(worker: usize, inner: Arc<dyn Logger>) -> Self {
        Self { worker, inner }
    }

    /// Index of the worker this handle belongs to.
    pub fn worker(&self) -> usize {
        self.worker
    }
}

impl Logger for WorkerLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        self.inner
            .log(level, format_args!("[worker {}] {}", self.worker, args));
    }
}

impl std::fmt::Debug for WorkerLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerLogger")
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}
