//! Logger handles passed explicitly through the job.
//!
//! Nothing in the pipeline reaches for a global logger. The orchestrator
//! builds one [`WorkerLogger`] per worker thread and hands it to every
//! stage of every cell that worker processes, so log lines can always be
//! traced back to the worker that emitted them.
//!
//! # Implementations
//!
//! - [`TracingLogger`]: production adapter that forwards to `tracing`
//! - [`WorkerLogger`]: wraps another logger and prefixes the worker index
//! - [`MemoryLogger`]: keeps lines in memory, used by tests
//! - [`NoOpLogger`]: discards everything
//!
//! # Usage
//!
//! ```
//! use shatter::log::{Logger, NoOpLogger, WorkerLogger};
//! use shatter::log_info;
//! use std::sync::Arc;
//!
//! let base: Arc<dyn Logger> = Arc::new(NoOpLogger);
//! let logger = WorkerLogger::new(3, base);
//! log_info!(logger, "cell {} completed", 42);
//! ```

mod adapters;
mod r#trait;
mod worker;

pub use adapters::{MemoryLogger, NoOpLogger, TracingLogger};
pub use r#trait::{LogLevel, Logger};
pub use worker::WorkerLogger;
