//! Error types for the per-cell pipeline.
//!
//! Every stage returns its own error type; [`CellError`] is what the
//! orchestrator sees. None of these abort a job: they fail the cell, the
//! cell id goes to the ledger and the worker moves on.

use thiserror::Error;

use crate::geometry::{GeometryError, ProjectionError};
use crate::store::StoreError;

/// Errors building the arrangement or decomposing it into shards.
#[derive(Debug, Error)]
pub enum ArrangementError {
    /// The cell's own boundary cannot bound a face
    #[error("invalid cell boundary: {0}")]
    InvalidCellBoundary(#[source] GeometryError),

    /// Noding produced no edges
    #[error("noded arrangement is empty")]
    EmptyArrangement,

    /// Shards do not add up to the cell
    #[error(
        "shard area {shard_area} does not match cell area {cell_area} \
         (relative error {relative_error:.3e})"
    )]
    CoverageMismatch {
        cell_area: f64,
        shard_area: f64,
        relative_error: f64,
    },
}

/// Errors deriving shard attributes.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    /// Shard has no administrative tag and the policy is `fail`
    #[error("shard {local_id} has no administrative tag")]
    MissingAdministrativeTag { local_id: u32 },

    /// Administrative code too short to carry a state prefix
    #[error("administrative code {code} has fewer than {digits} digits")]
    InvalidAdministrativeCode { code: i64, digits: u32 },

    /// Shard could not be projected to UTM
    #[error("reprojection of shard {local_id} failed: {source}")]
    Reprojection {
        local_id: u32,
        #[source]
        source: ProjectionError,
    },

    /// Cell geometry has no extent to pick a UTM zone from
    #[error("cell has an empty extent")]
    EmptyExtent,
}

/// Why a cell failed.
#[derive(Debug, Error)]
pub enum CellError {
    #[error("data store error: {0}")]
    Store(#[from] StoreError),

    #[error("arrangement build error: {0}")]
    Arrangement(#[from] ArrangementError),

    #[error("enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    /// A stage panicked; the message is the panic payload
    #[error("cell pipeline panicked: {0}")]
    Panicked(String),
}

impl CellError {
    /// Short category name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            CellError::Store(_) => "DataStoreError",
            CellError::Arrangement(_) => "ArrangementBuildError",
            CellError::Enrichment(_) => "EnrichmentError",
            CellError::Panicked(_) => "Panic",
        }
    }
}
