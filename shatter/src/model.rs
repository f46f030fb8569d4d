//! Core data types shared by every stage of a shatter job.
//!
//! Inputs ([`GridCell`], [`CandidateFeature`]) are read-only snapshots fetched
//! once per cell. [`Shard`]s are produced by decomposition, tagged by overlap
//! resolution and turned into [`OutputRecord`]s by enrichment. Nothing here
//! outlives the cell it belongs to.

use geo_types::{MultiPolygon, Polygon};
use std::collections::BTreeMap;
use std::fmt;

/// Layer tag carried by the first tag of every shard.
pub const GRID_SENTINEL: &str = "GRID";

/// Identifier of a grid cell.
pub type CellId = i64;

/// One cell of the reference grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub id: CellId,
    pub geometry: Polygon<f64>,
}

impl GridCell {
    pub fn new(id: CellId, geometry: Polygon<f64>) -> Self {
        Self { id, geometry }
    }
}

/// A source polygon from one of the input layers.
///
/// Only the exterior ring of the first polygon contributes boundaries to the
/// arrangement; the overlap test uses the whole geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFeature {
    pub id: i64,
    pub layer_tag: String,
    pub geometry: MultiPolygon<f64>,
}

impl CandidateFeature {
    pub fn new(id: i64, layer_tag: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id,
            layer_tag: layer_tag.into(),
            geometry,
        }
    }
}

/// A `(layer, feature id)` pair attached to a shard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    pub layer: String,
    pub feature_id: i64,
}

impl Tag {
    pub fn new(layer: impl Into<String>, feature_id: i64) -> Self {
        Self {
            layer: layer.into(),
            feature_id,
        }
    }

    /// The sentinel tag naming the cell a shard belongs to.
    pub fn grid(cell_id: CellId) -> Self {
        Self::new(GRID_SENTINEL, cell_id)
    }

    pub fn is_grid(&self) -> bool {
        self.layer == GRID_SENTINEL
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.layer, self.feature_id)
    }
}

/// An elementary face of a cell's decomposition.
///
/// `tags[0]` is always the grid sentinel for the owning cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Shard {
    /// Sequential id within the cell, starting at 1.
    pub local_id: u32,
    pub geometry: Polygon<f64>,
    pub tags: Vec<Tag>,
}

impl Shard {
    /// Create an untagged shard; only the sentinel is attached.
    pub fn new(local_id: u32, cell_id: CellId, geometry: Polygon<f64>) -> Self {
        Self {
            local_id,
            geometry,
            tags: vec![Tag::grid(cell_id)],
        }
    }

    /// Tags after the sentinel.
    pub fn feature_tags(&self) -> &[Tag] {
        self.tags.get(1..).unwrap_or(&[])
    }

    pub fn has_layer(&self, layer: &str) -> bool {
        self.tags.iter().any(|t| t.layer == layer)
    }
}

/// A fully attributed shard, ready for the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord {
    pub layer_tags: Vec<String>,
    pub feature_ids: Vec<i64>,
    /// Municipality code; `None` only under the `keep` missing-admin policy.
    pub admin_code: Option<i64>,
    /// Leading digits of `admin_code`.
    pub state_code: Option<i64>,
    pub source_feature_count: u32,
    pub per_layer_flag: BTreeMap<String, bool>,
    pub area_ha: f64,
    pub geometry: Polygon<f64>,
}

/// The ordered set of layer tags that receive a presence column.
///
/// Fixed before any worker starts so every cell writes the same columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSchema {
    tags: Vec<String>,
}

impl LayerSchema {
    /// Build a schema from tags, dropping duplicates, blanks and the grid
    /// sentinel while keeping first-seen order.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for tag in tags {
            let tag = tag.into().trim().to_string();
            if tag.is_empty() || tag == GRID_SENTINEL || out.contains(&tag) {
                continue;
            }
            out.push(tag);
        }
        Self { tags: out }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Presence column name for a tag: `is_` plus the lowercased tag, with
    /// anything outside `[a-z0-9_]` replaced by `_`.
    pub fn column_name(tag: &str) -> String {
        let cleaned: String = tag
            .chars()
            .map(|c| {
                let c = c.to_ascii_lowercase();
                if c.is_ascii_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("is_{}", cleaned)
    }

    /// Presence flags for a shard, one entry per schema tag.
    pub fn flags_for(&self, shard: &Shard) -> BTreeMap<String, bool> {
        self.tags
            .iter()
            .map(|tag| (tag.clone(), shard.has_layer(tag)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    fn unit_square() -> Polygon<f64> {
        polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)]
    }

    #[test]
    fn test_new_shard_has_only_sentinel() {
        let shard = Shard::new(1, 42, unit_square());
        assert_eq!(shard.tags, vec![Tag::new("GRID", 42)]);
        assert!(shard.tags[0].is_grid());
        assert!(shard.feature_tags().is_empty());
    }

    #[test]
    fn test_feature_tags_skip_sentinel() {
        let mut shard = Shard::new(1, 42, unit_square());
        shard.tags.push(Tag::new("CAR", 7));
        assert_eq!(shard.feature_tags(), &[Tag::new("CAR", 7)]);
        assert!(shard.has_layer("CAR"));
        assert!(!shard.has_layer("MUN"));
    }

    #[test]
    fn test_layer_schema_dedupes_and_drops_sentinel() {
        let schema = LayerSchema::new(["CAR", "MUN", "CAR", "GRID", " ", "UC"]);
        assert_eq!(schema.tags(), &["CAR", "MUN", "UC"]);
        assert_eq!(schema.len(), 3);
        assert!(schema.contains("MUN"));
    }

    #[test]
    fn test_column_name_sanitizes() {
        assert_eq!(LayerSchema::column_name("CAR"), "is_car");
        assert_eq!(LayerSchema::column_name("terra-indigena"), "is_terra_indigena");
    }

    #[test]
    fn test_flags_follow_schema() {
        let schema = LayerSchema::new(["CAR", "UC"]);
        let mut shard = Shard::new(1, 1, unit_square());
        shard.tags.push(Tag::new("CAR", 3));
        shard.tags.push(Tag::new("MUN", 5));

        let flags = schema.flags_for(&shard);
        assert_eq!(flags.len(), 2);
        assert_eq!(flags["CAR"], true);
        assert_eq!(flags["UC"], false);
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(Tag::new("CAR", 12).to_string(), "CAR:12");
    }
}
