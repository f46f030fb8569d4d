//! Concrete logger backends.

use crate::log::{LogLevel, Logger};
use std::fmt::Arguments;
use std::sync::Mutex;

/// Logger that forwards every line to the `tracing` crate.
///
/// The subscriber itself is installed by [`crate::logging::init_logging`];
/// without one, lines are silently dropped by `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!("{}", args),
            LogLevel::Debug => tracing::debug!("{}", args),
            LogLevel::Info => tracing::info!("{}", args),
            LogLevel::Warn => tracing::warn!("{}", args),
            LogLevel::Error => tracing::error!("{}", args),
        }
    }
}

/// Logger that discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

/// Logger that keeps formatted lines in memory.
///
/// Tests use it to assert on per-cell diagnostics (discard counters,
/// slowest-stage lines) without installing a global subscriber.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured line, oldest first.
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Captured lines at `level` that contain `needle`.
    pub fn matching(&self, level: LogLevel, needle: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, line)| *l == level && line.contains(needle))
            .map(|(_, line)| line)
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, args.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_loggers_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TracingLogger>();
        assert_send_sync::<NoOpLogger>();
        assert_send_sync::<MemoryLogger>();
    }

    #[test]
    fn test_tracing_logger_without_subscriber_does_not_panic() {
        let logger: Box<dyn Logger> = Box::new(TracingLogger);
        logger.info(format_args!("cell {} done", 1));
        logger.error(format_args!("cell {} failed", 2));
    }

    #[test]
    fn test_memory_logger_captures_levels() {
        let logger = Arc::new(MemoryLogger::new());
        crate::log_info!(logger, "cell {} completed", 7);
        crate::log_warn!(logger, "cell {} discarded {} candidates", 7, 2);

        let lines = logger.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (LogLevel::Info, "cell 7 completed".to_string()));
        assert_eq!(
            logger.matching(LogLevel::Warn, "discarded"),
            vec!["cell 7 discarded 2 candidates".to_string()]
        );
    }

    #[test]
    fn test_noop_logger_accepts_everything() {
        let logger = NoOpLogger;
        crate::log_trace!(logger, "ignored");
        crate::log_error!(logger, "ignored too");
    }
}
