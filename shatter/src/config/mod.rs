//! Job configuration loaded from an INI file.
//!
//! The file is split the same way the settings are consumed:
//!
//! - [`settings`]: one plain struct per `[section]`
//! - [`defaults`]: `DEFAULT_*` constants and `ConfigFile::default()`
//! - [`parser`]: INI → [`ConfigFile`], the only place key names appear
//! - [`file`]: loading, validation and the [`ConfigFileError`] type
//!
//! # Example
//!
//! ```
//! use shatter::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.enrichment.count_layer_tag, "CAR");
//! ```

mod defaults;
mod file;
mod parser;
mod settings;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CandidateSettings, ConfigFile, EnrichmentSettings, GridSettings, LayerSettings,
    LedgerSettings, LoggingSettings, NodingSettings, OutputSettings, StoreSettings,
    WorkerSettings,
};
