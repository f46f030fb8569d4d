//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use crate::pipeline::MissingAdminPolicy;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = section.get("backend") {
            config.store.backend = parse_value(
                "store",
                "backend",
                &v.to_lowercase(),
                "must be 'postgis' or 'file'",
            )?;
        }
        if let Some(v) = non_empty(section.get("url")) {
            config.store.url = Some(v.to_string());
        }
    }

    // [grid] section
    if let Some(section) = ini.section(Some("grid")) {
        if let Some(v) = non_empty(section.get("source")) {
            config.grid.source = Some(v.to_string());
        }
    }

    // [candidates] section
    if let Some(section) = ini.section(Some("candidates")) {
        if let Some(v) = non_empty(section.get("source_table")) {
            config.candidates.source_table = Some(v.to_string());
        }
    }

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = non_empty(section.get("schema")) {
            config.output.schema = v.to_string();
        }
        if let Some(v) = non_empty(section.get("table")) {
            config.output.table = v.to_string();
        }
        if let Some(v) = non_empty(section.get("directory")) {
            config.output.directory = expand_tilde(v);
        }
        if let Some(v) = section.get("srid") {
            config.output.srid =
                parse_value("output", "srid", v, "must be an integer spatial reference id")?;
        }
    }

    // [workers] section
    if let Some(section) = ini.section(Some("workers")) {
        if let Some(v) = section.get("count") {
            config.workers.count =
                parse_value("workers", "count", v, "must be a positive integer")?;
        }
    }

    // [enrichment] section
    if let Some(section) = ini.section(Some("enrichment")) {
        if let Some(v) = non_empty(section.get("administrative_layer_tag")) {
            config.enrichment.administrative_layer_tag = Some(v.to_string());
        }
        if let Some(v) = non_empty(section.get("count_layer_tag")) {
            config.enrichment.count_layer_tag = v.to_string();
        }
        if let Some(v) = section.get("drop_non_administrative_shards") {
            config.enrichment.missing_administrative = if parse_bool(v) {
                MissingAdminPolicy::Drop
            } else {
                MissingAdminPolicy::Keep
            };
        }
        // The explicit policy wins over the boolean shorthand
        if let Some(v) = section.get("missing_administrative_policy") {
            config.enrichment.missing_administrative = parse_value(
                "enrichment",
                "missing_administrative_policy",
                &v.to_lowercase(),
                "must be 'drop', 'keep' or 'fail'",
            )?;
        }
        if let Some(v) = section.get("state_code_digits") {
            config.enrichment.state_code_digits = parse_value(
                "enrichment",
                "state_code_digits",
                v,
                "must be a positive integer",
            )?;
        }
    }

    // [layers] section
    if let Some(section) = ini.section(Some("layers")) {
        if let Some(v) = section.get("tags") {
            config.layers.tags = v
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    // [noding] section
    if let Some(section) = ini.section(Some("noding")) {
        if let Some(v) = section.get("snap_precision") {
            config.noding.snap_precision = parse_value(
                "noding",
                "snap_precision",
                v,
                "must be a positive number (source units)",
            )?;
        }
        if let Some(v) = section.get("coverage_tolerance") {
            config.noding.coverage_tolerance = parse_value(
                "noding",
                "coverage_tolerance",
                v,
                "must be a positive number (relative)",
            )?;
        }
    }

    // [ledger] section
    if let Some(section) = ini.section(Some("ledger")) {
        if let Some(v) = non_empty(section.get("path")) {
            config.ledger.path = expand_tilde(v);
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section.get("file")) {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

/// Parse a single value, mapping failure to [`ConfigFileError::InvalidValue`].
fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a boolean value from a config string.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive)
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
