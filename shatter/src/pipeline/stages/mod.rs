//! Pipeline stages.
//!
//! Each stage is a plain function over a [`CellContext`](super::CellContext):
//!
//! 1. [`build_arrangement`]: validate candidate rings, node them with the
//!    cell boundary
//! 2. [`decompose`]: polygonize and keep faces inside the cell
//! 3. [`resolve_overlaps`]: tag each shard with the candidates covering it
//! 4. [`enrich`]: derive codes, flags and UTM area

mod arrangement;
mod decompose;
mod enrich;
mod overlap;

pub use arrangement::{build_arrangement, Arrangement};
pub use decompose::decompose;
pub use enrich::{enrich, state_code, Enriched, MissingAdminPolicy};
pub use overlap::{resolve_overlaps, OverlapIndex};
