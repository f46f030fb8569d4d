//! Configuration file loading and validation.
//!
//! Settings structs live in [`super::settings`], constants in
//! [`super::defaults`] and INI parsing in [`super::parser`].

use ini::Ini;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;
use crate::pipeline::MissingAdminPolicy;
use crate::store::StoreBackend;

/// Configuration errors. All of them are fatal at job start.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the INI file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Config file does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Required setting absent
    #[error("Missing configuration: {section}.{key} - {reason}")]
    Missing {
        section: String,
        key: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Load configuration from the default path (~/.shatter/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path. A missing file is an error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Err(ConfigFileError::NotFound(path.to_path_buf()));
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Check that every setting the selected backend and policy need is present.
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        if self.grid.source.is_none() {
            return Err(missing("grid", "source", "location of the cell partition"));
        }
        if self.candidates.source_table.is_none() {
            return Err(missing(
                "candidates",
                "source_table",
                "spatial source queried per cell",
            ));
        }
        if self.store.backend == StoreBackend::Postgis && self.store.url.is_none() {
            return Err(missing("store", "url", "required by the postgis backend"));
        }
        if self.workers.count == 0 {
            return Err(ConfigFileError::InvalidValue {
                section: "workers".to_string(),
                key: "count".to_string(),
                value: "0".to_string(),
                reason: "at least one worker is required".to_string(),
            });
        }
        if self.enrichment.state_code_digits == 0 {
            return Err(ConfigFileError::InvalidValue {
                section: "enrichment".to_string(),
                key: "state_code_digits".to_string(),
                value: "0".to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        if !(self.noding.snap_precision > 0.0 && self.noding.snap_precision.is_finite()) {
            return Err(ConfigFileError::InvalidValue {
                section: "noding".to_string(),
                key: "snap_precision".to_string(),
                value: self.noding.snap_precision.to_string(),
                reason: "must be a positive number".to_string(),
            });
        }
        if !(self.noding.coverage_tolerance >= 0.0 && self.noding.coverage_tolerance.is_finite()) {
            return Err(ConfigFileError::InvalidValue {
                section: "noding".to_string(),
                key: "coverage_tolerance".to_string(),
                value: self.noding.coverage_tolerance.to_string(),
                reason: "must be a non-negative number".to_string(),
            });
        }
        if self.enrichment.administrative_layer_tag.is_none()
            && self.enrichment.missing_administrative != MissingAdminPolicy::Keep
        {
            return Err(missing(
                "enrichment",
                "administrative_layer_tag",
                "dropping or failing shards without an administrative layer needs one; \
                 set drop_non_administrative_shards = false to run without it",
            ));
        }
        Ok(())
    }
}

fn missing(section: &str, key: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::Missing {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// Get the path to the config directory (~/.shatter).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shatter")
}

/// Get the path to the config file (~/.shatter/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_file_config() -> ConfigFile {
        let mut config = ConfigFile::default();
        config.store.backend = StoreBackend::File;
        config.grid.source = Some("grid.ndjson".to_string());
        config.candidates.source_table = Some("input.ndjson".to_string());
        config.enrichment.administrative_layer_tag = Some("MUN".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.store.backend, StoreBackend::Postgis);
        assert_eq!(config.output.srid, 4674);
        assert_eq!(config.enrichment.count_layer_tag, "CAR");
        assert_eq!(
            config.enrichment.missing_administrative,
            MissingAdminPolicy::Drop
        );
        assert!(config.workers.count >= 1);
    }

    #[test]
    fn test_load_nonexistent_is_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let result = ConfigFile::load_from(&config_path);
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert!(valid_file_config().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_grid_source() {
        let mut config = valid_file_config();
        config.grid.source = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigFileError::Missing { ref key, .. }) if key == "source"
        ));
    }

    #[test]
    fn test_validate_requires_url_for_postgis() {
        let mut config = valid_file_config();
        config.store.backend = StoreBackend::Postgis;
        assert!(matches!(
            config.validate(),
            Err(ConfigFileError::Missing { ref key, .. }) if key == "url"
        ));
    }

    #[test]
    fn test_validate_drop_policy_needs_admin_layer() {
        let mut config = valid_file_config();
        config.enrichment.administrative_layer_tag = None;
        assert!(config.validate().is_err());

        config.enrichment.missing_administrative = MissingAdminPolicy::Keep;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let mut config = valid_file_config();
        config.workers.count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_coverage_tolerance() {
        for bad in [-1e-6, f64::NAN, f64::INFINITY] {
            let mut config = valid_file_config();
            config.noding.coverage_tolerance = bad;
            assert!(matches!(
                config.validate(),
                Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "coverage_tolerance"
            ));
        }

        let mut config = valid_file_config();
        config.noding.coverage_tolerance = 0.0;
        assert!(config.validate().is_ok());
    }
}
