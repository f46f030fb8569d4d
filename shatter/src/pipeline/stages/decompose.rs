//! Decomposition stage: faces of the arrangement that lie inside the cell.

use geo::{Area, Contains, InteriorPoint};

use crate::geometry::{polygonize, NodedArrangement};
use crate::model::Shard;
use crate::pipeline::context::CellContext;
use crate::pipeline::error::ArrangementError;

/// Polygonize the arrangement and keep every face whose interior point lies
/// inside the cell, numbering them from 1 in production order.
///
/// The kept faces must cover the cell: if their summed area differs from the
/// cell's by more than the configured relative tolerance the cell fails.
pub fn decompose(
    ctx: &CellContext<'_>,
    arrangement: &NodedArrangement,
) -> Result<Vec<Shard>, ArrangementError> {
    let mut shards = Vec::new();
    for face in polygonize(arrangement) {
        let Some(point) = face.interior_point() else {
            continue;
        };
        if ctx.cell.geometry.contains(&point) {
            let local_id = shards.len() as u32 + 1;
            shards.push(Shard::new(local_id, ctx.cell.id, face));
        }
    }

    let cell_area = ctx.cell.geometry.unsigned_area();
    let shard_area: f64 = shards.iter().map(|s| s.geometry.unsigned_area()).sum();
    let relative_error = (shard_area - cell_area).abs() / cell_area;

    // NaN must fail too
    if !(relative_error <= ctx.config.coverage_tolerance) {
        return Err(ArrangementError::CoverageMismatch {
            cell_area,
            shard_area,
            relative_error,
        });
    }

    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::node_rings;
    use crate::log::NoOpLogger;
    use crate::model::{GridCell, LayerSchema, Tag};
    use crate::pipeline::PipelineConfig;
    use geo_types::{line_string, polygon};

    #[test]
    fn test_faces_outside_cell_are_dropped() {
        let cell = GridCell::new(
            5,
            polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)],
        );
        let config = PipelineConfig::default();
        let schema = LayerSchema::default();
        let ctx = CellContext::new(&cell, &config, &schema, &NoOpLogger);

        // Square straddling the right edge of the cell
        let other = line_string![
            (x: 1.0, y: 0.5), (x: 3.0, y: 0.5), (x: 3.0, y: 1.5), (x: 1.0, y: 1.5), (x: 1.0, y: 0.5)
        ];
        let noded = node_rings([cell.geometry.exterior(), &other], config.snap_precision);

        let shards = decompose(&ctx, &noded).unwrap();
        assert_eq!(shards.len(), 2);
        let ids: Vec<u32> = shards.iter().map(|s| s.local_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(shards.iter().all(|s| s.tags == vec![Tag::grid(5)]));

        let total: f64 = shards.iter().map(|s| s.geometry.unsigned_area()).sum();
        assert!((total - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_coverage_mismatch() {
        let cell = GridCell::new(
            5,
            polygon![(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)],
        );
        let config = PipelineConfig::default();
        let schema = LayerSchema::default();
        let ctx = CellContext::new(&cell, &config, &schema, &NoOpLogger);

        // An arrangement that does not contain the cell boundary covers only part of it
        let partial = line_string![
            (x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0), (x: 0.0, y: 0.0)
        ];
        let noded = node_rings([&partial], config.snap_precision);

        assert!(matches!(
            decompose(&ctx, &noded),
            Err(ArrangementError::CoverageMismatch { .. })
        ));
    }
}
