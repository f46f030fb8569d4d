//! Arrangement stage: one noded line set per cell.

use crate::geometry::{node_rings, primary_exterior_ring, validate_ring, NodedArrangement};
use crate::log_debug;
use crate::model::CandidateFeature;
use crate::pipeline::context::CellContext;
use crate::pipeline::error::ArrangementError;

/// Noded boundaries of a cell and the candidates that took part.
#[derive(Debug, Clone)]
pub struct Arrangement {
    pub noded: NodedArrangement,
    /// Indices into the candidate slice of every candidate whose ring was valid
    pub kept: Vec<usize>,
    /// Candidates dropped for an invalid ring
    pub discarded: usize,
}

/// Node the cell boundary together with the primary exterior ring of every
/// valid candidate.
///
/// An invalid candidate ring is logged and counted, never fatal. An invalid
/// cell boundary or an empty result fails the cell.
pub fn build_arrangement(
    ctx: &CellContext<'_>,
    candidates: &[CandidateFeature],
) -> Result<Arrangement, ArrangementError> {
    let boundary = ctx.cell.geometry.exterior();
    validate_ring(boundary).map_err(ArrangementError::InvalidCellBoundary)?;

    let mut rings = Vec::with_capacity(candidates.len() + 1);
    let mut kept = Vec::with_capacity(candidates.len());
    let mut discarded = 0;

    for (index, candidate) in candidates.iter().enumerate() {
        let ring = primary_exterior_ring(&candidate.geometry)
            .and_then(|ring| validate_ring(ring).map(|_| ring));
        match ring {
            Ok(ring) => {
                rings.push(ring);
                kept.push(index);
            }
            Err(e) => {
                discarded += 1;
                log_debug!(
                    ctx.logger,
                    "cell {}: discarding candidate {}:{}: {}",
                    ctx.cell.id,
                    candidate.layer_tag,
                    candidate.id,
                    e
                );
            }
        }
    }

    rings.push(boundary);
    rings.extend(ctx.cell.geometry.interiors());

    let noded = node_rings(rings, ctx.config.snap_precision);
    if noded.is_empty() {
        return Err(ArrangementError::EmptyArrangement);
    }

    Ok(Arrangement {
        noded,
        kept,
        discarded,
    })
}
