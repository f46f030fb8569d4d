//! Planar geometry kernel for cell decomposition.
//!
//! - [`ring`]: candidate ring extraction and validity checks
//! - [`noding`]: splitting boundary rings at every mutual intersection and
//!   snapping the result to a fixed precision grid
//! - [`polygonize`]: tracing the noded arrangement into minimal faces
//! - [`projection`]: UTM transverse Mercator on GRS80 for area measurement
//!
//! Geometries use `geo-types`; predicates (containment, interior points,
//! segment intersection) come from `geo`.

mod error;
mod noding;
mod polygonize;
mod projection;
mod ring;
mod segment_index;

pub use error::GeometryError;
pub use noding::{node_rings, GridKey, NodedArrangement};
pub use polygonize::polygonize;
pub use projection::{
    central_meridian, utm_zone, ProjectionError, TransverseMercator, GRS80_A, GRS80_F,
    UTM_MAX_LAT, UTM_MIN_LAT,
};
pub use ring::{primary_exterior_ring, ring_signed_area, validate_ring};
