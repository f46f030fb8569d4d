//! Noding: turn a set of rings into a planar graph of non-crossing edges.
//!
//! Every pairwise intersection (proper crossing, T-junction or collinear
//! overlap) becomes a vertex on both segments involved. Vertices are then
//! snapped to an integer grid of the configured precision, which makes
//! coordinates shared between rings compare exactly. Zero-length and
//! duplicate edges are dropped.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo_types::{Coord, Line, LineString};
use std::collections::BTreeSet;

use super::segment_index::SegmentIndex;

/// A vertex position on the snapping grid: `round(coordinate / precision)`.
pub type GridKey = (i64, i64);

/// Noded line arrangement: undirected edges between snapped vertices.
///
/// Edges are stored once with their endpoints in ascending order, and the
/// edge list itself is sorted, so the same input always yields the same
/// arrangement.
#[derive(Debug, Clone, PartialEq)]
pub struct NodedArrangement {
    precision: f64,
    edges: Vec<(GridKey, GridKey)>,
}

impl NodedArrangement {
    pub fn edges(&self) -> &[(GridKey, GridKey)] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    /// Coordinate of a grid vertex.
    pub fn coord(&self, key: GridKey) -> Coord<f64> {
        Coord {
            x: key.0 as f64 * self.precision,
            y: key.1 as f64 * self.precision,
        }
    }
}

/// Snap a coordinate to the grid.
pub(super) fn snap(c: Coord<f64>, precision: f64) -> GridKey {
    ((c.x / precision).round() as i64, (c.y / precision).round() as i64)
}

/// Node all segments of `rings` against each other.
///
/// `precision` must be positive; callers validate it at configuration time.
pub fn node_rings<'a, I>(rings: I, precision: f64) -> NodedArrangement
where
    I: IntoIterator<Item = &'a LineString<f64>>,
{
    let lines: Vec<Line<f64>> = rings
        .into_iter()
        .flat_map(|ring| ring.lines())
        .filter(|line| line.start != line.end)
        .collect();

    let mut splits: Vec<Vec<Coord<f64>>> =
        lines.iter().map(|line| vec![line.start, line.end]).collect();

    for (i, j) in SegmentIndex::new(&lines).candidate_pairs() {
        match line_intersection(lines[i], lines[j]) {
            None => {}
            Some(LineIntersection::SinglePoint { intersection, .. }) => {
                splits[i].push(intersection);
                splits[j].push(intersection);
            }
            Some(LineIntersection::Collinear { intersection }) => {
                for point in [intersection.start, intersection.end] {
                    splits[i].push(point);
                    splits[j].push(point);
                }
            }
        }
    }

    let mut edges: BTreeSet<(GridKey, GridKey)> = BTreeSet::new();
    for (line, mut points) in lines.iter().zip(splits) {
        points.sort_by(|a, b| parameter(line, *a).total_cmp(&parameter(line, *b)));

        let mut keys: Vec<GridKey> = points.into_iter().map(|p| snap(p, precision)).collect();
        keys.dedup();

        for pair in keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a != b {
                edges.insert(if a < b { (a, b) } else { (b, a) });
            }
        }
    }

    NodedArrangement {
        precision,
        edges: edges.into_iter().collect(),
    }
}

/// Position of `point` along `line`, 0 at start and 1 at end.
fn parameter(line: &Line<f64>, point: Coord<f64>) -> f64 {
    let d = line.delta();
    let v = point - line.start;
    (v.x * d.x + v.y * d.y) / (d.x * d.x + d.y * d.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::line_string;

    const P: f64 = 1e-9;

    fn square(x0: f64, y0: f64, size: f64) -> LineString<f64> {
        line_string![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size), (x: x0, y: y0)
        ]
    }

    #[test]
    fn test_single_ring_keeps_its_edges() {
        let ring = square(0.0, 0.0, 1.0);
        let arrangement = node_rings([&ring], P);
        assert_eq!(arrangement.len(), 4);
    }

    #[test]
    fn test_crossing_squares_are_split() {
        // Overlapping in a quarter: two crossings, each splitting one edge
        // of both squares, so 8 edges become 12.
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let arrangement = node_rings([&a, &b], P);
        assert_eq!(arrangement.len(), 12);
    }

    #[test]
    fn test_shared_edges_are_not_duplicated() {
        // Adjacent squares share the edge x = 1
        let a = square(0.0, 0.0, 1.0);
        let b = square(1.0, 0.0, 1.0);
        let arrangement = node_rings([&a, &b], P);
        assert_eq!(arrangement.len(), 7);
    }

    #[test]
    fn test_identical_rings_collapse() {
        let a = square(0.0, 0.0, 1.0);
        let b = square(0.0, 0.0, 1.0);
        assert_eq!(node_rings([&a, &b], P), node_rings([&a], P));
    }

    #[test]
    fn test_collinear_overlap_is_noded() {
        // b's bottom edge overlaps the middle of a's bottom edge
        let a = square(0.0, 0.0, 4.0);
        let b = line_string![
            (x: 1.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 1.0), (x: 1.0, y: 1.0), (x: 1.0, y: 0.0)
        ];
        let arrangement = node_rings([&a, &b], P);
        // a: bottom split in 3, other sides 3 -> 6 edges; b adds 3 non-shared edges
        assert_eq!(arrangement.len(), 9);
    }

    #[test]
    fn test_coord_round_trips_through_snapping() {
        let ring = square(-47.5, -15.25, 0.5);
        let arrangement = node_rings([&ring], P);
        let (a, _) = arrangement.edges()[0];
        let c = arrangement.coord(a);
        assert_eq!(snap(c, P), a);
    }

    #[test]
    fn test_empty_input() {
        let rings: Vec<LineString<f64>> = Vec::new();
        assert!(node_rings(&rings, P).is_empty());
    }
}
