//! CLI runner for common setup.
//!
//! Loads and validates the configuration and installs logging, so command
//! handlers start from a ready [`ConfigFile`].

use crate::error::CliError;
use std::path::Path;
use tracing::info;
use shatter::config::ConfigFile;
use shatter::logging::{init_logging, LoggingGuard};

/// Runner that manages CLI lifecycle.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Explicit config file; `None` uses `~/.shatter/config.ini`
    /// * `stdout` - Mirror log lines to stdout
    /// * `debug` - Enables debug-level logging regardless of RUST_LOG
    pub fn new(config_path: Option<&Path>, stdout: bool, debug: bool) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let logging_guard = init_logging(&config.logging.file, stdout, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Mutable access for command-line overrides.
    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("shatter v{}", shatter::VERSION);
        info!("shatter CLI: {} command", command);
    }
}

/// Load a config file and check it is complete enough to run.
pub fn load_config(config_path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match config_path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shatter::config::ConfigFileError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_config(Some(&temp.path().join("absent.ini")));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigFileError::NotFound(_)))
        ));
    }

    #[test]
    fn test_load_config_rejects_incomplete_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        fs::write(&path, "[workers]\ncount = 2\n").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_load_config_file_backend() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        fs::write(
            &path,
            "[store]\nbackend = file\n\
             [grid]\nsource = grid.ndjson\n\
             [candidates]\nsource_table = candidates.ndjson\n\
             [enrichment]\nadministrative_layer_tag = MUN\n",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.grid.source.as_deref(), Some("grid.ndjson"));
    }
}
