//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI file. These are pure
//! data types with no parsing or validation logic.

use crate::pipeline::MissingAdminPolicy;
use crate::store::StoreBackend;
use std::path::PathBuf;

/// Complete job configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Which store backend serves the grid, candidates and output
    pub store: StoreSettings,
    /// Location of the cell partition
    pub grid: GridSettings,
    /// Source of candidate polygons
    pub candidates: CandidateSettings,
    /// Output table or directory
    pub output: OutputSettings,
    /// Worker pool size
    pub workers: WorkerSettings,
    /// Attribute derivation rules
    pub enrichment: EnrichmentSettings,
    /// Explicit per-layer flag columns
    pub layers: LayerSettings,
    /// Arrangement noding tolerances
    pub noding: NodingSettings,
    /// Failure ledger location
    pub ledger: LedgerSettings,
    /// Job log location
    pub logging: LoggingSettings,
}

/// `[store]` section.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Connection string for the `postgis` backend.
    pub url: Option<String>,
}

/// `[grid]` section.
#[derive(Debug, Clone, Default)]
pub struct GridSettings {
    /// Grid table (`postgis`) or NDJSON file (`file`).
    pub source: Option<String>,
}

/// `[candidates]` section.
#[derive(Debug, Clone, Default)]
pub struct CandidateSettings {
    /// Candidate table (`postgis`) or NDJSON file (`file`), queried per
    /// cell by bounding box.
    pub source_table: Option<String>,
}

/// `[output]` section.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    /// Database schema of the output table.
    pub schema: String,
    /// Output table name.
    pub table: String,
    /// Directory for per-cell output files (`file` backend).
    pub directory: PathBuf,
    /// SRID of every geometry read and written.
    pub srid: i32,
}

/// `[workers]` section.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Number of worker threads; each owns its own store connections.
    pub count: usize,
}

/// `[enrichment]` section.
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
    /// Layer whose feature id is the administrative (municipality) code.
    pub administrative_layer_tag: Option<String>,
    /// Layer whose occurrences are counted into `n_car`.
    pub count_layer_tag: String,
    /// What happens to shards without the administrative layer.
    pub missing_administrative: MissingAdminPolicy,
    /// Leading digits of the administrative code that form the state code.
    pub state_code_digits: u32,
}

/// `[layers]` section.
#[derive(Debug, Clone, Default)]
pub struct LayerSettings {
    /// Explicit layer schema. Empty means "negotiate from the candidate
    /// source before workers start".
    pub tags: Vec<String>,
}

/// `[noding]` section.
#[derive(Debug, Clone)]
pub struct NodingSettings {
    /// Grid size vertices are snapped to, in source units.
    pub snap_precision: f64,
    /// Relative tolerance between the cell area and the summed shard area.
    pub coverage_tolerance: f64,
}

/// `[ledger]` section.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// Append-only file receiving one failed cell id per line.
    pub path: PathBuf,
}

/// `[logging]` section.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub file: PathBuf,
}
