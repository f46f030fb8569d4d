//! Boundary ring extraction and validation.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo_types::{Coord, Line, LineString, MultiPolygon};

use super::error::GeometryError;
use super::segment_index::SegmentIndex;

/// Exterior ring of the first polygon component.
pub fn primary_exterior_ring(geometry: &MultiPolygon<f64>) -> Result<&LineString<f64>, GeometryError> {
    geometry
        .0
        .first()
        .map(|polygon| polygon.exterior())
        .ok_or(GeometryError::Empty)
}

/// Check that a ring can bound a face: finite, at least four coordinates,
/// closed, non-zero area and free of self-intersections.
pub fn validate_ring(ring: &LineString<f64>) -> Result<(), GeometryError> {
    let coords = &ring.0;

    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(GeometryError::NonFinite);
    }
    if coords.len() < 4 {
        return Err(GeometryError::TooFewCoordinates(coords.len()));
    }
    if coords.first() != coords.last() {
        return Err(GeometryError::NotClosed);
    }
    if ring_signed_area(coords) == 0.0 {
        return Err(GeometryError::ZeroArea);
    }
    if let Some(at) = find_self_intersection(coords) {
        return Err(GeometryError::SelfIntersecting { x: at.x, y: at.y });
    }
    Ok(())
}

/// Shoelace area of a closed coordinate sequence; positive when
/// counter-clockwise.
pub fn ring_signed_area(coords: &[Coord<f64>]) -> f64 {
    let Some(origin) = coords.first() else {
        return 0.0;
    };
    // Translate to the first vertex to limit cancellation
    let twice: f64 = coords
        .windows(2)
        .map(|w| {
            let (a, b) = (w[0] - *origin, w[1] - *origin);
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

fn find_self_intersection(coords: &[Coord<f64>]) -> Option<Coord<f64>> {
    let mut points: Vec<Coord<f64>> = coords.to_vec();
    points.dedup();

    let lines: Vec<Line<f64>> = points.windows(2).map(|w| Line::new(w[0], w[1])).collect();
    let n = lines.len();
    if n < 3 {
        return None;
    }

    for (i, j) in SegmentIndex::new(&lines).candidate_pairs() {
        let adjacent = j == i + 1 || (i == 0 && j == n - 1);
        match line_intersection(lines[i], lines[j]) {
            None => {}
            Some(LineIntersection::SinglePoint { intersection, .. }) => {
                let shared = if j == i + 1 { lines[i].end } else { lines[i].start };
                if !adjacent || intersection != shared {
                    return Some(intersection);
                }
            }
            Some(LineIntersection::Collinear { intersection }) => {
                return Some(intersection.start);
            }
        }
    }
    None
}
