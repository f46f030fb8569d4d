//! R-tree over line segments for pairwise intersection candidates.

use geo_types::Line;
use rstar::{RTree, RTreeObject, AABB};

#[derive(Debug, Clone, Copy)]
struct IndexedSegment {
    line: Line<f64>,
    index: usize,
}

impl RTreeObject for IndexedSegment {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.line.start.x, self.line.start.y],
            [self.line.end.x, self.line.end.y],
        )
    }
}

/// Static index over a slice of segments, addressed by slice position.
pub(super) struct SegmentIndex {
    tree: RTree<IndexedSegment>,
}

impl SegmentIndex {
    pub(super) fn new(lines: &[Line<f64>]) -> Self {
        let items = lines
            .iter()
            .enumerate()
            .map(|(index, &line)| IndexedSegment { line, index })
            .collect();
        Self {
            tree: RTree::bulk_load(items),
        }
    }

    /// Every unordered pair `(i, j)` with `i < j` whose envelopes touch,
    /// sorted so callers see a stable order.
    pub(super) fn candidate_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for segment in self.tree.iter() {
            for other in self
                .tree
                .locate_in_envelope_intersecting(&segment.envelope())
            {
                if other.index > segment.index {
                    pairs.push((segment.index, other.index));
                }
            }
        }
        pairs.sort_unstable();
        pairs
    }
}
