//! Per-cell decomposition and attribution pipeline.
//!
//! ```text
//! fetch ─► arrangement ─► decompose ─► overlap ─► enrich ─► deliver
//! ```
//!
//! [`process_cell`] runs every stage for one cell against a store
//! connection. [`shatter_cell`] is the pure middle part (no I/O), usable
//! on in-memory inputs.
//!
//! Stage errors are converted into [`CellError`] at this boundary; the
//! orchestrator decides what a failed cell means for the job.

mod context;
mod error;
mod stages;
mod timing;

pub use context::{CellContext, PipelineConfig};
pub use error::{ArrangementError, CellError, EnrichmentError};
pub use stages::{
    build_arrangement, decompose, enrich, resolve_overlaps, state_code, Arrangement, Enriched,
    MissingAdminPolicy, OverlapIndex,
};
pub use timing::{Stage, StageTimings};

use geo::BoundingRect;

use crate::log::Logger;
use crate::model::{CandidateFeature, CellId, GridCell, LayerSchema, OutputRecord, Shard};
use crate::store::StoreConnection;

/// Result of decomposing and attributing one cell.
#[derive(Debug, Clone, Default)]
pub struct ShatteredCell {
    /// Tagged shards, before the missing-admin policy is applied
    pub shards: Vec<Shard>,
    pub records: Vec<OutputRecord>,
    /// Candidates discarded for an invalid ring
    pub discarded: usize,
    /// Shards left out by the `drop` policy
    pub dropped: usize,
}

/// Counters reported for a completed cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellOutcome {
    pub cell_id: CellId,
    pub candidates: usize,
    pub discarded: usize,
    pub shards: usize,
    pub records: usize,
}

/// Arrangement, decomposition, overlap and enrichment of one cell.
pub fn shatter_cell(
    ctx: &CellContext<'_>,
    candidates: &[CandidateFeature],
    timings: &mut StageTimings,
) -> Result<ShatteredCell, CellError> {
    let arrangement = timings.time(Stage::Arrangement, || build_arrangement(ctx, candidates))?;

    let mut shards = timings.time(Stage::Decompose, || decompose(ctx, &arrangement.noded))?;

    timings.time(Stage::Overlap, || {
        let index = OverlapIndex::new(candidates, &arrangement.kept);
        resolve_overlaps(&index, &mut shards);
    });

    let enriched = timings.time(Stage::Enrich, || enrich(ctx, &shards))?;

    Ok(ShatteredCell {
        shards,
        records: enriched.records,
        discarded: arrangement.discarded,
        dropped: enriched.dropped,
    })
}

/// Run the full pipeline for one cell on a dedicated connection.
///
/// `timings` is filled in as stages finish, so a failed cell still reports
/// how far it got.
pub fn process_cell(
    cell_id: CellId,
    conn: &mut dyn StoreConnection,
    config: &PipelineConfig,
    schema: &LayerSchema,
    logger: &dyn Logger,
    timings: &mut StageTimings,
) -> Result<CellOutcome, CellError> {
    let (cell, candidates) = timings.time(Stage::Fetch, || fetch(conn, cell_id))?;

    let ctx = CellContext::new(&cell, config, schema, logger);
    let shattered = shatter_cell(&ctx, &candidates, timings)?;

    let written = timings.time(Stage::Deliver, || {
        conn.write_records(cell_id, &shattered.records, schema)
    })?;

    Ok(CellOutcome {
        cell_id,
        candidates: candidates.len(),
        discarded: shattered.discarded,
        shards: shattered.shards.len(),
        records: written,
    })
}

fn fetch(
    conn: &mut dyn StoreConnection,
    cell_id: CellId,
) -> Result<(GridCell, Vec<CandidateFeature>), CellError> {
    let cell = conn.fetch_cell(cell_id)?;
    let Some(bbox) = cell.geometry.bounding_rect() else {
        return Err(ArrangementError::EmptyArrangement.into());
    };
    let candidates = conn.candidates(bbox)?;
    Ok((cell, candidates))
}
