//! Geometry error types.

use thiserror::Error;

/// Reasons a boundary ring cannot take part in an arrangement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Geometry has no polygon component
    #[error("geometry has no polygon component")]
    Empty,

    /// Ring has fewer than four coordinates
    #[error("ring has {0} coordinates, at least 4 required")]
    TooFewCoordinates(usize),

    /// First and last coordinates differ
    #[error("ring is not closed")]
    NotClosed,

    /// NaN or infinite coordinate
    #[error("ring has a non-finite coordinate")]
    NonFinite,

    /// Ring encloses no area
    #[error("ring has zero area")]
    ZeroArea,

    /// Two non-adjacent edges touch or cross
    #[error("ring self-intersects near ({x}, {y})")]
    SelfIntersecting { x: f64, y: f64 },
}
