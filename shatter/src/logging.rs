//! Process-wide tracing bootstrap for a shatter job.
//!
//! Installs a `tracing` subscriber with:
//! - a file layer writing to the configured job log (truncated on start)
//! - an optional stdout layer for interactive runs
//! - an `EnvFilter` driven by `RUST_LOG` (default `info`, `debug` on request)
//!
//! Library code never calls this; it only sees the [`crate::log::Logger`]
//! handle that the CLI builds on top of the installed subscriber.

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping it flushes and closes the non-blocking file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize logging for a job run.
///
/// # Arguments
///
/// * `log_path` - Full path of the job log file; parent directories are created
/// * `stdout` - Also print lines to stdout
/// * `debug` - Force `debug` level regardless of `RUST_LOG`
///
/// # Errors
///
/// Returns an I/O error if the log directory or file cannot be prepared.
pub fn init_logging(log_path: &Path, stdout: bool, debug: bool) -> Result<LoggingGuard, io::Error> {
    let (log_dir, log_file) = split_log_path(log_path);
    fs::create_dir_all(&log_dir)?;

    // One job, one log: previous content is discarded
    fs::write(log_dir.join(&log_file), "")?;

    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true);

    let stdout_layer = stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_target(false)
            .compact()
    });

    let env_filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::other(e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Split a log path into its directory and file name, defaulting to
/// the current directory and [`default_log_file`].
fn split_log_path(log_path: &Path) -> (std::path::PathBuf, String) {
    let dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| std::path::PathBuf::from("."));
    let file = log_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| default_log_file().to_string());
    (dir, file)
}

/// Default log directory, relative to the working directory.
pub fn default_log_dir() -> &'static str {
    "logs"
}

/// Default log file name.
pub fn default_log_file() -> &'static str {
    "shatter.log"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_paths() {
        assert_eq!(default_log_dir(), "logs");
        assert_eq!(default_log_file(), "shatter.log");
    }

    #[test]
    fn test_split_log_path_with_directory() {
        let (dir, file) = split_log_path(Path::new("/var/log/shatter/job.log"));
        assert_eq!(dir, PathBuf::from("/var/log/shatter"));
        assert_eq!(file, "job.log");
    }

    #[test]
    fn test_split_log_path_bare_file_uses_current_dir() {
        let (dir, file) = split_log_path(Path::new("job.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(file, "job.log");
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    // The subscriber is process-global and can only be installed once, so
    // init_logging itself is exercised by the CLI rather than unit tests.
}
