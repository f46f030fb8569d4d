//! Newline-delimited JSON backend.
//!
//! Grid lines are `{"id": 18, "wkt": "POLYGON(...)"}`, candidate lines
//! `{"id": 7, "layer": "CAR", "wkt": "MULTIPOLYGON(...)"}`. Both files are
//! read once when the factory is built and shared by every connection.
//! Each cell's records are written to `split_<cell>.ndjson` in the output
//! directory, replacing any earlier file for the same cell.

use geo::BoundingRect;
use geo_types::Rect;
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::codec::{parse_multipolygon, parse_polygon, polygon_to_wkt};
use super::error::StoreError;
use super::traits::{CandidateProvider, ConnectionFactory, GridSource, ResultSink, StoreConnection};
use crate::model::{CandidateFeature, CellId, GridCell, LayerSchema, OutputRecord};

#[derive(Debug, Deserialize)]
struct GridLine {
    id: CellId,
    wkt: String,
}

#[derive(Debug, Deserialize)]
struct CandidateLine {
    id: i64,
    layer: String,
    wkt: String,
}

/// One line of a per-cell output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub cell_id: CellId,
    pub id_layer: Vec<String>,
    pub id_feature: Vec<i64>,
    pub cd_mun: Option<i64>,
    pub cd_uf: Option<i64>,
    pub n_car: u32,
    /// Presence flags keyed by column name (`is_<tag>`)
    #[serde(flatten)]
    pub flags: BTreeMap<String, bool>,
    pub area_ha: f64,
    pub wkt: String,
}

impl OutputRow {
    fn from_record(cell_id: CellId, record: &OutputRecord, schema: &LayerSchema) -> Self {
        let flags = schema
            .tags()
            .iter()
            .map(|tag| {
                let present = record.per_layer_flag.get(tag).copied().unwrap_or(false);
                (LayerSchema::column_name(tag), present)
            })
            .collect();
        Self {
            cell_id,
            id_layer: record.layer_tags.clone(),
            id_feature: record.feature_ids.clone(),
            cd_mun: record.admin_code,
            cd_uf: record.state_code,
            n_car: record.source_feature_count,
            flags,
            area_ha: record.area_ha,
            wkt: polygon_to_wkt(&record.geometry),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CandidateEnvelope {
    aabb: AABB<[f64; 2]>,
    index: usize,
}

impl RTreeObject for CandidateEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

struct FileData {
    cells: BTreeMap<CellId, GridCell>,
    candidates: Vec<CandidateFeature>,
    index: RTree<CandidateEnvelope>,
}

/// Loads grid and candidate files once and hands out in-memory connections.
#[derive(Clone)]
pub struct FileStoreFactory {
    data: Arc<FileData>,
    grid_path: PathBuf,
    candidate_path: PathBuf,
    output_dir: PathBuf,
}

impl FileStoreFactory {
    /// Read and index both input files.
    pub fn open(
        grid_path: impl Into<PathBuf>,
        candidate_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let grid_path = grid_path.into();
        let candidate_path = candidate_path.into();

        let mut cells = BTreeMap::new();
        for (line, row) in read_lines::<GridLine>(&grid_path)? {
            let geometry = parse_polygon(&row.wkt).map_err(|e| at_line(&grid_path, line, e))?;
            cells.insert(row.id, GridCell::new(row.id, geometry));
        }

        let mut candidates = Vec::new();
        for (line, row) in read_lines::<CandidateLine>(&candidate_path)? {
            let geometry =
                parse_multipolygon(&row.wkt).map_err(|e| at_line(&candidate_path, line, e))?;
            candidates.push(CandidateFeature::new(row.id, row.layer, geometry));
        }

        let envelopes = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, c)| {
                c.geometry.bounding_rect().map(|r| CandidateEnvelope {
                    aabb: rect_to_aabb(&r),
                    index,
                })
            })
            .collect();

        Ok(Self {
            data: Arc::new(FileData {
                cells,
                candidates,
                index: RTree::bulk_load(envelopes),
            }),
            grid_path,
            candidate_path,
            output_dir: output_dir.into(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the output file for a cell.
    pub fn output_path(&self, cell_id: CellId) -> PathBuf {
        output_file(&self.output_dir, cell_id)
    }
}

impl ConnectionFactory for FileStoreFactory {
    fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        Ok(Box::new(FileStore {
            data: Arc::clone(&self.data),
            output_dir: self.output_dir.clone(),
        }))
    }

    fn describe(&self) -> String {
        format!(
            "file grid={} candidates={} output={}",
            self.grid_path.display(),
            self.candidate_path.display(),
            self.output_dir.display()
        )
    }
}

/// In-memory connection over the shared file data.
pub struct FileStore {
    data: Arc<FileData>,
    output_dir: PathBuf,
}

impl GridSource for FileStore {
    fn list_cell_ids(&mut self) -> Result<Vec<CellId>, StoreError> {
        Ok(self.data.cells.keys().copied().collect())
    }

    fn fetch_cell(&mut self, id: CellId) -> Result<GridCell, StoreError> {
        self.data
            .cells
            .get(&id)
            .cloned()
            .ok_or(StoreError::CellNotFound(id))
    }
}

impl CandidateProvider for FileStore {
    fn candidates(&mut self, bbox: Rect<f64>) -> Result<Vec<CandidateFeature>, StoreError> {
        let mut hits: Vec<usize> = self
            .data
            .index
            .locate_in_envelope_intersecting(&rect_to_aabb(&bbox))
            .map(|e| e.index)
            .collect();
        hits.sort_unstable();
        Ok(hits
            .into_iter()
            .map(|i| self.data.candidates[i].clone())
            .collect())
    }

    fn distinct_layers(&mut self) -> Result<Vec<String>, StoreError> {
        let layers: BTreeSet<&str> = self
            .data
            .candidates
            .iter()
            .map(|c| c.layer_tag.as_str())
            .collect();
        Ok(layers.into_iter().map(str::to_string).collect())
    }
}

impl ResultSink for FileStore {
    fn prepare_output(&mut self, _schema: &LayerSchema) -> Result<(), StoreError> {
        fs::create_dir_all(&self.output_dir).map_err(StoreError::io(&self.output_dir))
    }

    fn write_records(
        &mut self,
        cell_id: CellId,
        records: &[OutputRecord],
        schema: &LayerSchema,
    ) -> Result<usize, StoreError> {
        let path = output_file(&self.output_dir, cell_id);
        let file = File::create(&path).map_err(StoreError::io(&path))?;
        let mut writer = BufWriter::new(file);

        for record in records {
            let row = OutputRow::from_record(cell_id, record, schema);
            serde_json::to_writer(&mut writer, &row).map_err(|source| StoreError::Json {
                path: path.clone(),
                line: 0,
                source,
            })?;
            writer.write_all(b"\n").map_err(StoreError::io(&path))?;
        }
        writer.flush().map_err(StoreError::io(&path))?;
        Ok(records.len())
    }
}

fn output_file(dir: &Path, cell_id: CellId) -> PathBuf {
    dir.join(format!("split_{}.ndjson", cell_id))
}

fn rect_to_aabb(rect: &Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

fn at_line(path: &Path, line: usize, error: StoreError) -> StoreError {
    StoreError::Wkt(format!("{}:{}: {}", path.display(), line, error))
}

/// Parse every non-blank line; line numbers are 1-based.
fn read_lines<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<(usize, T)>, StoreError> {
    let file = File::open(path).map_err(StoreError::io(path))?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(StoreError::io(path))?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            line: i + 1,
            source,
        })?;
        out.push((i + 1, value));
    }
    Ok(out)
}

/// Read a per-cell output file back.
pub fn read_output(path: &Path) -> Result<Vec<OutputRow>, StoreError> {
    Ok(read_lines::<OutputRow>(path)?
        .into_iter()
        .map(|(_, row)| row)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{coord, polygon};
    use tempfile::TempDir;

    fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
        let grid = dir.join("grid.ndjson");
        fs::write(
            &grid,
            concat!(
                r#"{"id": 2, "wkt": "POLYGON((1 0, 2 0, 2 1, 1 1, 1 0))"}"#,
                "\n\n",
                r#"{"id": 1, "wkt": "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))"}"#,
                "\n"
            ),
        )
        .unwrap();

        let input = dir.join("input.ndjson");
        fs::write(
            &input,
            concat!(
                r#"{"id": 10, "layer": "MUN", "wkt": "POLYGON((-1 -1, 3 -1, 3 2, -1 2, -1 -1))"}"#,
                "\n",
                r#"{"id": 11, "layer": "CAR", "wkt": "POLYGON((0.2 0.2, 0.4 0.2, 0.4 0.4, 0.2 0.2))"}"#,
                "\n",
                r#"{"id": 12, "layer": "CAR", "wkt": "MULTIPOLYGON(((5 5, 6 5, 6 6, 5 5)))"}"#,
                "\n"
            ),
        )
        .unwrap();
        (grid, input)
    }

    #[test]
    fn test_grid_ids_are_sorted() {
        let dir = TempDir::new().unwrap();
        let (grid, input) = write_inputs(dir.path());
        let factory = FileStoreFactory::open(grid, input, dir.path().join("out")).unwrap();
        let mut conn = factory.connect().unwrap();

        assert_eq!(conn.list_cell_ids().unwrap(), vec![1, 2]);
        assert_eq!(conn.fetch_cell(2).unwrap().id, 2);
        assert!(matches!(conn.fetch_cell(9), Err(StoreError::CellNotFound(9))));
    }

    #[test]
    fn test_candidates_by_bbox() {
        let dir = TempDir::new().unwrap();
        let (grid, input) = write_inputs(dir.path());
        let factory = FileStoreFactory::open(grid, input, dir.path().join("out")).unwrap();
        let mut conn = factory.connect().unwrap();

        let bbox = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let ids: Vec<i64> = conn.candidates(bbox).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![10, 11]);

        assert_eq!(conn.distinct_layers().unwrap(), vec!["CAR", "MUN"]);
    }

    #[test]
    fn test_bad_json_reports_line() {
        let dir = TempDir::new().unwrap();
        let (grid, _) = write_inputs(dir.path());
        let input = dir.path().join("bad.ndjson");
        fs::write(&input, "{\"id\": 1, \"layer\": \"CAR\", \"wkt\": \"POLYGON((0 0, 1 0, 1 1, 0 0))\"}\nnot json\n").unwrap();

        let result = FileStoreFactory::open(grid, input, dir.path().join("out"));
        assert!(matches!(result, Err(StoreError::Json { line: 2, .. })));
    }

    #[test]
    fn test_write_records_creates_cell_file() {
        let dir = TempDir::new().unwrap();
        let (grid, input) = write_inputs(dir.path());
        let factory = FileStoreFactory::open(grid, input, dir.path().join("out")).unwrap();
        let schema = LayerSchema::new(["CAR", "MUN"]);
        let mut conn = factory.connect().unwrap();
        conn.prepare_output(&schema).unwrap();

        let record = OutputRecord {
            layer_tags: vec!["GRID".into(), "MUN".into()],
            feature_ids: vec![1, 3550308],
            admin_code: Some(3550308),
            state_code: Some(35),
            source_feature_count: 0,
            per_layer_flag: schema
                .tags()
                .iter()
                .map(|t| (t.clone(), t == "MUN"))
                .collect(),
            area_ha: 12.5,
            geometry: polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
        };
        assert_eq!(conn.write_records(1, &[record], &schema).unwrap(), 1);

        let rows = read_output(&factory.output_path(1)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cell_id, 1);
        assert_eq!(rows[0].cd_uf, Some(35));
        assert_eq!(rows[0].flags.get("is_mun"), Some(&true));
        assert_eq!(rows[0].flags.get("is_car"), Some(&false));
    }
}
