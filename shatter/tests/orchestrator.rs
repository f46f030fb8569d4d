//! Integration tests for job orchestration over the file backend.
//!
//! These tests run whole jobs and verify:
//! - Every selected cell is processed and written exactly once
//! - Failed cells land in the ledger and the summary, and the job goes on
//! - A panic inside one cell fails only that cell
//! - Ledger reruns rotate the previous ledger aside
//! - Per-cell diagnostics reach the job logger

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use geo_types::Rect;
use shatter::log::{LogLevel, MemoryLogger};
use shatter::model::{CandidateFeature, CellId, GridCell, LayerSchema, OutputRecord};
use shatter::orchestrator::{read_ledger, run_job, CellSelection, JobConfig};
use shatter::pipeline::{MissingAdminPolicy, PipelineConfig};
use shatter::store::{
    read_output, CandidateProvider, ConnectionFactory, FileStoreFactory, GridSource, ResultSink,
    StoreConnection, StoreError,
};
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// WKT of a 1/8 degree cell, the `n`th one east of (-48, -16).
fn cell_wkt(n: i64) -> String {
    let west = -48.0 + (n - 1) as f64 * 0.125;
    let east = west + 0.125;
    format!(
        "POLYGON(({w} -16, {e} -16, {e} -15.875, {w} -15.875, {w} -16))",
        w = west,
        e = east
    )
}

struct Fixture {
    dir: TempDir,
    factory: FileStoreFactory,
}

impl Fixture {
    /// Three cells in a row, one municipality over all of them and a rural
    /// property straddling the border of cells 1 and 2.
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let grid = dir.path().join("grid.ndjson");
        let candidates = dir.path().join("candidates.ndjson");

        let grid_lines: Vec<String> = (1..=3)
            .map(|n| format!(r#"{{"id": {}, "wkt": "{}"}}"#, n, cell_wkt(n)))
            .collect();
        fs::write(&grid, grid_lines.join("\n")).unwrap();

        let candidate_lines = [
            r#"{"id": 5300108, "layer": "MUN", "wkt": "MULTIPOLYGON(((-48 -16, -47.5 -16, -47.5 -15.875, -48 -15.875, -48 -16)))"}"#,
            r#"{"id": 41, "layer": "CAR", "wkt": "MULTIPOLYGON(((-47.9 -15.95, -47.85 -15.95, -47.85 -15.9, -47.9 -15.9, -47.9 -15.95)))"}"#,
        ];
        fs::write(&candidates, candidate_lines.join("\n")).unwrap();

        let factory = FileStoreFactory::open(grid, candidates, dir.path().join("out")).unwrap();
        Self { dir, factory }
    }

    fn ledger_path(&self) -> PathBuf {
        self.dir.path().join("failed_cells.txt")
    }

    fn job(&self, selection: CellSelection) -> JobConfig {
        JobConfig {
            workers: 2,
            pipeline: PipelineConfig {
                administrative_layer_tag: Some("MUN".to_string()),
                missing_administrative: MissingAdminPolicy::Drop,
                ..PipelineConfig::default()
            },
            layer_tags: Vec::new(),
            ledger_path: self.ledger_path(),
            selection,
        }
    }
}

/// Connection wrapper that panics when asked for one particular cell.
struct PanickingStore {
    inner: Box<dyn StoreConnection>,
    poison: CellId,
}

impl GridSource for PanickingStore {
    fn list_cell_ids(&mut self) -> Result<Vec<CellId>, StoreError> {
        self.inner.list_cell_ids()
    }

    fn fetch_cell(&mut self, id: CellId) -> Result<GridCell, StoreError> {
        if id == self.poison {
            panic!("corrupt geometry in cell {}", id);
        }
        self.inner.fetch_cell(id)
    }
}

impl CandidateProvider for PanickingStore {
    fn candidates(&mut self, bbox: Rect<f64>) -> Result<Vec<CandidateFeature>, StoreError> {
        self.inner.candidates(bbox)
    }

    fn distinct_layers(&mut self) -> Result<Vec<String>, StoreError> {
        self.inner.distinct_layers()
    }
}

impl ResultSink for PanickingStore {
    fn prepare_output(&mut self, schema: &LayerSchema) -> Result<(), StoreError> {
        self.inner.prepare_output(schema)
    }

    fn write_records(
        &mut self,
        cell_id: CellId,
        records: &[OutputRecord],
        schema: &LayerSchema,
    ) -> Result<usize, StoreError> {
        self.inner.write_records(cell_id, records, schema)
    }
}

struct PanickingFactory {
    inner: FileStoreFactory,
    poison: CellId,
}

impl ConnectionFactory for PanickingFactory {
    fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        Ok(Box::new(PanickingStore {
            inner: self.inner.connect()?,
            poison: self.poison,
        }))
    }

    fn describe(&self) -> String {
        format!("panicking({})", self.inner.describe())
    }
}

fn ledger_ids(path: &Path) -> Vec<CellId> {
    read_ledger(path).unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_all_cells_complete_and_write_output() {
    let fixture = Fixture::new();
    let logger = Arc::new(MemoryLogger::new());

    let summary = run_job(
        &fixture.job(CellSelection::All),
        &fixture.factory,
        logger.clone(),
    )
    .unwrap();

    assert_eq!(summary.completed, 3);
    assert_eq!(summary.failed, 0);
    assert!(!summary.has_failures());
    assert!(summary.failed_cells.is_empty());
    assert!(ledger_ids(&fixture.ledger_path()).is_empty());

    for cell_id in 1..=3 {
        let rows = read_output(&fixture.factory.output_path(cell_id)).unwrap();
        assert!(!rows.is_empty(), "cell {} wrote nothing", cell_id);
        for row in &rows {
            assert_eq!(row.cell_id, cell_id);
            assert_eq!(row.id_layer[0], "GRID");
            assert_eq!(row.id_feature[0], cell_id);
            assert_eq!(row.cd_mun, Some(5300108));
            assert_eq!(row.cd_uf, Some(53));
            assert!(row.flags.contains_key("is_car"));
            assert_eq!(row.flags.get("is_mun"), Some(&true));
            assert!(row.area_ha > 0.0);
        }
    }

    // The rural property straddles cells 1 and 2 only
    let claimed = |cell_id| {
        read_output(&fixture.factory.output_path(cell_id))
            .unwrap()
            .iter()
            .filter(|r| r.flags.get("is_car") == Some(&true))
            .count()
    };
    assert_eq!(claimed(1), 1);
    assert_eq!(claimed(2), 1);
    assert_eq!(claimed(3), 0);
    assert_eq!(summary.records, 5);

    let completed = logger.matching(LogLevel::Info, "completed candidates=");
    assert_eq!(completed.len(), 3);
    assert!(completed.iter().all(|line| line.contains("slowest=")));
}

#[test]
fn test_missing_cell_is_recorded_and_job_continues() {
    let fixture = Fixture::new();
    let logger = Arc::new(MemoryLogger::new());

    let summary = run_job(
        &fixture.job(CellSelection::Explicit(vec![1, 42, 3])),
        &fixture.factory,
        logger.clone(),
    )
    .unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.failed_cells, vec![42]);
    assert_eq!(ledger_ids(&fixture.ledger_path()), vec![42]);

    let errors = logger.matching(LogLevel::Error, "cell 42: failed [DataStoreError]");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("grid cell 42 not found"));
}

#[test]
fn test_panicking_cell_fails_alone() {
    let fixture = Fixture::new();
    let factory = PanickingFactory {
        inner: fixture.factory.clone(),
        poison: 2,
    };
    let logger = Arc::new(MemoryLogger::new());

    let summary = run_job(&fixture.job(CellSelection::All), &factory, logger.clone()).unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed_cells, vec![2]);
    assert_eq!(ledger_ids(&fixture.ledger_path()), vec![2]);

    let errors = logger.matching(LogLevel::Error, "[Panic]");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("corrupt geometry in cell 2"));
}

#[test]
fn test_rerun_ledger_rotates_previous_ledger() {
    let fixture = Fixture::new();
    let logger = Arc::new(MemoryLogger::new());
    let ledger = fixture.ledger_path();

    let first = run_job(
        &fixture.job(CellSelection::Explicit(vec![42, 2])),
        &fixture.factory,
        logger.clone(),
    )
    .unwrap();
    assert_eq!(first.failed_cells, vec![42]);

    let rerun = run_job(
        &fixture.job(CellSelection::Ledger(ledger.clone())),
        &fixture.factory,
        logger.clone(),
    )
    .unwrap();

    // Only the ledger's cell ran, and it failed again into a fresh ledger
    assert_eq!(rerun.total(), 1);
    assert_eq!(rerun.failed_cells, vec![42]);
    assert_eq!(ledger_ids(&ledger), vec![42]);

    let rotated = ledger.with_file_name("failed_cells.txt.1");
    assert_eq!(ledger_ids(&rotated), vec![42]);
}

#[test]
fn test_explicit_layer_schema_controls_flag_columns() {
    let fixture = Fixture::new();
    let mut job = fixture.job(CellSelection::Explicit(vec![3]));
    job.layer_tags = vec!["MUN".to_string(), "UC".to_string()];

    let summary = run_job(&job, &fixture.factory, Arc::new(MemoryLogger::new())).unwrap();
    assert_eq!(summary.completed, 1);

    let rows = read_output(&fixture.factory.output_path(3)).unwrap();
    let columns: Vec<&String> = rows[0].flags.keys().collect();
    assert_eq!(columns, vec!["is_mun", "is_uc"]);
    assert_eq!(rows[0].flags.get("is_uc"), Some(&false));
}
