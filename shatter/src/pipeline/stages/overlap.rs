//! Overlap stage: which candidates cover each shard.
//!
//! A static R-tree over candidate bounding boxes is built once per cell.
//! For a shard's interior point the nearest boxes are walked in distance
//! order and only those at distance zero (boxes containing the point) are
//! tested exactly against the full candidate geometry.

use geo::{BoundingRect, Contains, InteriorPoint};
use geo_types::Point;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::model::{CandidateFeature, Shard, Tag};

#[derive(Debug, Clone, Copy)]
struct CandidateBox {
    aabb: AABB<[f64; 2]>,
    index: usize,
}

impl RTreeObject for CandidateBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

impl PointDistance for CandidateBox {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.aabb.distance_2(point)
    }
}

/// Spatial index over a cell's candidates.
pub struct OverlapIndex<'a> {
    candidates: &'a [CandidateFeature],
    tree: RTree<CandidateBox>,
}

impl<'a> OverlapIndex<'a> {
    /// Index the candidates at `indices` (positions in `candidates`).
    pub fn new(candidates: &'a [CandidateFeature], indices: &[usize]) -> Self {
        let boxes = indices
            .iter()
            .filter_map(|&index| {
                let rect = candidates.get(index)?.geometry.bounding_rect()?;
                Some(CandidateBox {
                    aabb: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                    index,
                })
            })
            .collect();
        Self {
            candidates,
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Positions of every indexed candidate containing `point`, ascending.
    pub fn covering(&self, point: &Point<f64>) -> Vec<usize> {
        let query = [point.x(), point.y()];
        let mut hits: Vec<usize> = self
            .tree
            .nearest_neighbor_iter(&query)
            .take_while(|b| b.distance_2(&query) <= 0.0)
            .filter(|b| self.candidates[b.index].geometry.contains(point))
            .map(|b| b.index)
            .collect();
        hits.sort_unstable();
        hits
    }
}

/// Append `(layer, id)` tags of covering candidates to each shard, after
/// the sentinel and in candidate order.
pub fn resolve_overlaps(index: &OverlapIndex<'_>, shards: &mut [Shard]) {
    for shard in shards {
        let Some(point) = shard.geometry.interior_point() else {
            continue;
        };
        shard.tags.extend(index.covering(&point).into_iter().map(|i| {
            let candidate = &index.candidates[i];
            Tag::new(candidate.layer_tag.clone(), candidate.id)
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{point, polygon, MultiPolygon};

    fn candidates() -> Vec<CandidateFeature> {
        let big = polygon![(x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0)];
        // Triangle whose box covers (8, 2) but whose shape does not
        let triangle = polygon![(x: 5.0, y: 5.0), (x: 9.0, y: 5.0), (x: 5.0, y: 1.0)];
        let far = polygon![(x: 20.0, y: 20.0), (x: 21.0, y: 20.0), (x: 21.0, y: 21.0)];
        vec![
            CandidateFeature::new(100, "MUN", MultiPolygon::new(vec![big])),
            CandidateFeature::new(7, "CAR", MultiPolygon::new(vec![triangle])),
            CandidateFeature::new(8, "CAR", MultiPolygon::new(vec![far])),
        ]
    }

    #[test]
    fn test_box_prefilter_then_exact_test() {
        let candidates = candidates();
        let index = OverlapIndex::new(&candidates, &[0, 1, 2]);

        assert_eq!(index.covering(&point!(x: 8.0, y: 2.0)), vec![0]);
        assert_eq!(index.covering(&point!(x: 6.0, y: 4.0)), vec![0, 1]);
        assert!(index.covering(&point!(x: 50.0, y: 50.0)).is_empty());
    }

    #[test]
    fn test_only_listed_candidates_are_indexed() {
        let candidates = candidates();
        let index = OverlapIndex::new(&candidates, &[1]);
        assert_eq!(index.covering(&point!(x: 6.0, y: 4.0)), vec![1]);
    }

    #[test]
    fn test_resolve_appends_after_sentinel() {
        let candidates = candidates();
        let index = OverlapIndex::new(&candidates, &[0, 1, 2]);
        let mut shards = vec![
            Shard::new(1, 3, polygon![(x: 5.5, y: 3.5), (x: 6.5, y: 3.5), (x: 6.0, y: 4.2)]),
            Shard::new(2, 3, polygon![(x: 30.0, y: 30.0), (x: 31.0, y: 30.0), (x: 31.0, y: 31.0)]),
        ];

        resolve_overlaps(&index, &mut shards);

        assert_eq!(
            shards[0].tags,
            vec![Tag::grid(3), Tag::new("MUN", 100), Tag::new("CAR", 7)]
        );
        assert_eq!(shards[1].tags, vec![Tag::grid(3)]);
    }
}
