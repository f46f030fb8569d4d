//! Storage abstractions used by the pipeline and orchestrator.

use geo_types::Rect;

use super::error::StoreError;
use crate::model::{CandidateFeature, CellId, GridCell, LayerSchema, OutputRecord};

/// Read access to the reference grid.
pub trait GridSource {
    /// All cell ids, ascending.
    fn list_cell_ids(&mut self) -> Result<Vec<CellId>, StoreError>;

    /// Fetch one cell; unknown ids are [`StoreError::CellNotFound`].
    fn fetch_cell(&mut self, id: CellId) -> Result<GridCell, StoreError>;
}

/// Bounding-box access to the candidate polygons.
pub trait CandidateProvider {
    /// Candidates whose bounding box intersects `bbox`, in a stable order.
    fn candidates(&mut self, bbox: Rect<f64>) -> Result<Vec<CandidateFeature>, StoreError>;

    /// Distinct layer tags present in the candidate source, sorted.
    fn distinct_layers(&mut self) -> Result<Vec<String>, StoreError>;
}

/// Append-only destination for enriched shards.
pub trait ResultSink {
    /// Create whatever the output needs (table, indexes, directory).
    /// Called once per job before any worker starts.
    fn prepare_output(&mut self, schema: &LayerSchema) -> Result<(), StoreError>;

    /// Write all records of one cell; returns the number written.
    fn write_records(
        &mut self,
        cell_id: CellId,
        records: &[OutputRecord],
        schema: &LayerSchema,
    ) -> Result<usize, StoreError>;
}

/// A single connection able to serve every stage of a cell.
pub trait StoreConnection: GridSource + CandidateProvider + ResultSink + Send {}

impl<T> StoreConnection for T where T: GridSource + CandidateProvider + ResultSink + Send {}

/// Hands out connections; shared read-only by all workers.
pub trait ConnectionFactory: Send + Sync {
    fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError>;

    /// Short description for logs (never includes credentials).
    fn describe(&self) -> String;
}
