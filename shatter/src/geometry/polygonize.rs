//! Polygonization of a noded arrangement into minimal faces.
//!
//! Outgoing edges at every vertex are sorted by angle. Walking each directed
//! edge and turning to the next edge clockwise from the reverse direction
//! traces faces with the face on the left: bounded faces come out
//! counter-clockwise, the outside of each connected component clockwise.
//! A clockwise ring that lies strictly inside some bounded face is a hole
//! of the smallest such face; one that lies inside none is the unbounded
//! outside and is dropped.

use geo::{BoundingRect, Contains};
use geo_types::{Coord, LineString, Point, Polygon, Rect};
use std::collections::{BTreeMap, BTreeSet};

use super::noding::{GridKey, NodedArrangement};

struct Ring {
    keys: Vec<GridKey>,
    twice_area: i128,
}

/// Trace all minimal bounded faces of the arrangement, holes included.
///
/// Edges with a free end (dangles) never bound a face and are pruned first.
pub fn polygonize(arrangement: &NodedArrangement) -> Vec<Polygon<f64>> {
    let mut ids: BTreeMap<GridKey, usize> = BTreeMap::new();
    let mut keys: Vec<GridKey> = Vec::new();
    let mut adjacency: Vec<BTreeSet<usize>> = Vec::new();

    let mut node = |key: GridKey, adjacency: &mut Vec<BTreeSet<usize>>| -> usize {
        *ids.entry(key).or_insert_with(|| {
            keys.push(key);
            adjacency.push(BTreeSet::new());
            keys.len() - 1
        })
    };
    for &(a, b) in arrangement.edges() {
        let ia = node(a, &mut adjacency);
        let ib = node(b, &mut adjacency);
        adjacency[ia].insert(ib);
        adjacency[ib].insert(ia);
    }

    prune_dangles(&mut adjacency);

    let sorted: Vec<Vec<usize>> = adjacency
        .iter()
        .enumerate()
        .map(|(u, neighbours)| {
            let mut out: Vec<usize> = neighbours.iter().copied().collect();
            out.sort_by(|&a, &b| angle(&keys, u, a).total_cmp(&angle(&keys, u, b)));
            out
        })
        .collect();

    let rings = trace_rings(&keys, &sorted);
    assemble(arrangement, rings)
}

/// Repeatedly remove vertices of degree one together with their edge.
fn prune_dangles(adjacency: &mut [BTreeSet<usize>]) {
    let mut stack: Vec<usize> = (0..adjacency.len())
        .filter(|&u| adjacency[u].len() == 1)
        .collect();

    while let Some(u) = stack.pop() {
        if adjacency[u].len() != 1 {
            continue;
        }
        let Some(&v) = adjacency[u].iter().next() else {
            continue;
        };
        adjacency[u].clear();
        adjacency[v].remove(&u);
        if adjacency[v].len() == 1 {
            stack.push(v);
        }
    }
}

fn angle(keys: &[GridKey], from: usize, to: usize) -> f64 {
    let dx = (keys[to].0 - keys[from].0) as f64;
    let dy = (keys[to].1 - keys[from].1) as f64;
    dy.atan2(dx)
}

fn trace_rings(keys: &[GridKey], sorted: &[Vec<usize>]) -> Vec<Ring> {
    let mut visited: Vec<Vec<bool>> = sorted.iter().map(|n| vec![false; n.len()]).collect();
    let mut rings = Vec::new();

    for start in 0..sorted.len() {
        for start_slot in 0..sorted[start].len() {
            if visited[start][start_slot] {
                continue;
            }

            let mut ring_keys = Vec::new();
            let (mut u, mut slot) = (start, start_slot);
            loop {
                visited[u][slot] = true;
                ring_keys.push(keys[u]);

                let v = sorted[u][slot];
                let degree = sorted[v].len();
                let Some(back) = sorted[v].iter().position(|&w| w == u) else {
                    break;
                };
                u = v;
                slot = (back + degree - 1) % degree;

                if visited[u][slot] {
                    break;
                }
            }
            ring_keys.push(keys[start]);

            let twice_area = twice_signed_area(&ring_keys);
            if twice_area != 0 {
                rings.push(Ring {
                    keys: ring_keys,
                    twice_area,
                });
            }
        }
    }
    rings
}

/// Exact doubled shoelace area on grid keys.
fn twice_signed_area(keys: &[GridKey]) -> i128 {
    let origin = keys[0];
    keys.windows(2)
        .map(|w| {
            let (ax, ay) = ((w[0].0 - origin.0) as i128, (w[0].1 - origin.1) as i128);
            let (bx, by) = ((w[1].0 - origin.0) as i128, (w[1].1 - origin.1) as i128);
            ax * by - bx * ay
        })
        .sum()
}

fn assemble(arrangement: &NodedArrangement, rings: Vec<Ring>) -> Vec<Polygon<f64>> {
    let to_line_string =
        |keys: &[GridKey]| -> LineString<f64> { keys.iter().map(|&k| arrangement.coord(k)).collect() };

    let (shell_rings, hole_rings): (Vec<Ring>, Vec<Ring>) =
        rings.into_iter().partition(|r| r.twice_area > 0);

    let shells: Vec<(Polygon<f64>, Option<Rect<f64>>, i128)> = shell_rings
        .iter()
        .map(|r| {
            let polygon = Polygon::new(to_line_string(&r.keys), vec![]);
            let bbox = polygon.bounding_rect();
            (polygon, bbox, r.twice_area)
        })
        .collect();

    let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); shells.len()];
    for hole in &hole_rings {
        let probe: Coord<f64> = arrangement.coord(hole.keys[0]);
        let point = Point::from(probe);

        let owner = shells
            .iter()
            .enumerate()
            .filter(|(_, (_, bbox, _))| bbox.is_some_and(|b| rect_covers(&b, probe)))
            .filter(|(_, (polygon, _, _))| polygon.contains(&point))
            .min_by_key(|(_, (_, _, area))| *area)
            .map(|(i, _)| i);

        if let Some(i) = owner {
            holes[i].push(to_line_string(&hole.keys));
        }
    }

    shells
        .into_iter()
        .zip(holes)
        .map(|((polygon, _, _), interiors)| {
            let (exterior, _) = polygon.into_inner();
            Polygon::new(exterior, interiors)
        })
        .collect()
}

fn rect_covers(rect: &Rect<f64>, c: Coord<f64>) -> bool {
    let (min, max) = (rect.min(), rect.max());
    c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y
}
