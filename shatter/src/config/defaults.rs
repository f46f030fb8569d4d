//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::settings::*;
use crate::pipeline::MissingAdminPolicy;
use crate::store::StoreBackend;

/// Number of available CPU cores.
pub fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

// =============================================================================
// Store defaults
// =============================================================================

/// Default output schema, matching the historical `split` schema.
pub const DEFAULT_OUTPUT_SCHEMA: &str = "split";

/// Default output table.
pub const DEFAULT_OUTPUT_TABLE: &str = "shards";

/// Default directory for per-cell output files.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "outputs";

/// SIRGAS 2000 geographic coordinates.
pub const DEFAULT_SRID: i32 = 4674;

// =============================================================================
// Enrichment defaults
// =============================================================================

/// Layer counted into `n_car` (rural environmental registry parcels).
pub const DEFAULT_COUNT_LAYER_TAG: &str = "CAR";

/// IBGE municipality codes carry the state code in their first two digits.
pub const DEFAULT_STATE_CODE_DIGITS: u32 = 2;

// =============================================================================
// Noding defaults
// =============================================================================

/// Snap grid for arrangement vertices, in degrees (~0.1 mm at the equator).
pub const DEFAULT_SNAP_PRECISION: f64 = 1e-9;

/// Maximum relative difference between cell area and summed shard area.
pub const DEFAULT_COVERAGE_TOLERANCE: f64 = 1e-6;

// =============================================================================
// Ledger and logging defaults
// =============================================================================

/// Default failure ledger file.
pub const DEFAULT_LEDGER_FILE: &str = "failed_cells.txt";

/// Default job log file.
pub const DEFAULT_LOG_FILE: &str = "logs/shatter.log";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                backend: StoreBackend::Postgis,
                url: None,
            },
            grid: GridSettings::default(),
            candidates: CandidateSettings::default(),
            output: OutputSettings {
                schema: DEFAULT_OUTPUT_SCHEMA.to_string(),
                table: DEFAULT_OUTPUT_TABLE.to_string(),
                directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
                srid: DEFAULT_SRID,
            },
            workers: WorkerSettings { count: num_cpus() },
            enrichment: EnrichmentSettings {
                administrative_layer_tag: None,
                count_layer_tag: DEFAULT_COUNT_LAYER_TAG.to_string(),
                missing_administrative: MissingAdminPolicy::Drop,
                state_code_digits: DEFAULT_STATE_CODE_DIGITS,
            },
            layers: LayerSettings::default(),
            noding: NodingSettings {
                snap_precision: DEFAULT_SNAP_PRECISION,
                coverage_tolerance: DEFAULT_COVERAGE_TOLERANCE,
            },
            ledger: LedgerSettings {
                path: PathBuf::from(DEFAULT_LEDGER_FILE),
            },
            logging: LoggingSettings {
                file: PathBuf::from(DEFAULT_LOG_FILE),
            },
        }
    }
}
