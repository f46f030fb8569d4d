//! PostgreSQL/PostGIS backend using the synchronous `postgres` client.
//!
//! Every connection is a dedicated `Client`. Geometries travel as WKT
//! (`ST_AsText` out, `ST_GeomFromText` in) and the candidate query relies
//! on the `&&` bounding-box operator so a GiST index on the source table
//! does the prefiltering.

use geo_types::Rect;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use std::sync::Arc;

use super::codec::{parse_multipolygon, parse_polygon, polygon_to_wkt};
use super::error::StoreError;
use super::sql::{array_literal, insert_statement, output_table_ddl, text_array_literal, validate_identifier};
use super::traits::{CandidateProvider, ConnectionFactory, GridSource, ResultSink, StoreConnection};
use crate::model::{CandidateFeature, CellId, GridCell, LayerSchema, OutputRecord};

/// Table names and SRID shared by all connections of a job.
#[derive(Debug, Clone)]
pub struct PostgisTables {
    /// Grid table with `grid_id` and `geom` columns
    pub grid_table: String,
    /// Candidate table with `id`, `id_layer` and `geom` columns
    pub candidate_table: String,
    pub output_schema: String,
    pub output_table: String,
    pub srid: i32,
}

impl PostgisTables {
    /// Reject any table name that cannot be spliced into SQL safely.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_identifier(&self.grid_table)?;
        validate_identifier(&self.candidate_table)?;
        validate_identifier(&self.output_schema)?;
        validate_identifier(&self.output_table)?;
        Ok(())
    }
}

/// Opens one PostGIS connection per call.
#[derive(Debug, Clone)]
pub struct PostgisFactory {
    url: String,
    tables: Arc<PostgisTables>,
}

impl PostgisFactory {
    pub fn new(url: impl Into<String>, tables: PostgisTables) -> Result<Self, StoreError> {
        tables.validate()?;
        Ok(Self {
            url: url.into(),
            tables: Arc::new(tables),
        })
    }

    pub fn tables(&self) -> &PostgisTables {
        &self.tables
    }
}

impl ConnectionFactory for PostgisFactory {
    fn connect(&self) -> Result<Box<dyn StoreConnection>, StoreError> {
        let client = Client::connect(&self.url, NoTls).map_err(StoreError::Connection)?;
        Ok(Box::new(PostgisStore {
            client,
            tables: Arc::clone(&self.tables),
        }))
    }

    fn describe(&self) -> String {
        format!(
            "postgis grid={} candidates={} output={}.{}",
            self.tables.grid_table,
            self.tables.candidate_table,
            self.tables.output_schema,
            self.tables.output_table
        )
    }
}

/// A live connection serving grid, candidate and sink queries.
pub struct PostgisStore {
    client: Client,
    tables: Arc<PostgisTables>,
}

impl GridSource for PostgisStore {
    fn list_cell_ids(&mut self) -> Result<Vec<CellId>, StoreError> {
        let sql = format!(
            "SELECT grid_id::int8 FROM {} ORDER BY grid_id",
            self.tables.grid_table
        );
        let rows = self
            .client
            .query(sql.as_str(), &[])
            .map_err(StoreError::query("list grid cells"))?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    fn fetch_cell(&mut self, id: CellId) -> Result<GridCell, StoreError> {
        let sql = format!(
            "SELECT ST_AsText(geom) FROM {} WHERE grid_id = $1::int8",
            self.tables.grid_table
        );
        let row = self
            .client
            .query_opt(sql.as_str(), &[&id])
            .map_err(StoreError::query(format!("fetch grid cell {}", id)))?
            .ok_or(StoreError::CellNotFound(id))?;
        let text: String = row.get(0);
        Ok(GridCell::new(id, parse_polygon(&text)?))
    }
}

impl CandidateProvider for PostgisStore {
    fn candidates(&mut self, bbox: Rect<f64>) -> Result<Vec<CandidateFeature>, StoreError> {
        let sql = format!(
            "SELECT id::int8, id_layer::text, ST_AsText(geom) FROM {} \
             WHERE geom && ST_MakeEnvelope($1, $2, $3, $4, {}) ORDER BY id",
            self.tables.candidate_table, self.tables.srid
        );
        let (min, max) = (bbox.min(), bbox.max());
        let rows = self
            .client
            .query(sql.as_str(), &[&min.x, &min.y, &max.x, &max.y])
            .map_err(StoreError::query("query candidates"))?;

        rows.iter()
            .map(|row| {
                let id: i64 = row.get(0);
                let layer: String = row.get(1);
                let text: String = row.get(2);
                Ok(CandidateFeature::new(id, layer, parse_multipolygon(&text)?))
            })
            .collect()
    }

    fn distinct_layers(&mut self) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT id_layer::text FROM {} WHERE id_layer IS NOT NULL ORDER BY 1",
            self.tables.candidate_table
        );
        let rows = self
            .client
            .query(sql.as_str(), &[])
            .map_err(StoreError::query("list candidate layers"))?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}

impl ResultSink for PostgisStore {
    fn prepare_output(&mut self, schema: &LayerSchema) -> Result<(), StoreError> {
        let statements = output_table_ddl(
            &self.tables.output_schema,
            &self.tables.output_table,
            self.tables.srid,
            schema,
        )?;
        for statement in statements {
            self.client
                .batch_execute(&statement)
                .map_err(StoreError::query("prepare output table"))?;
        }
        Ok(())
    }

    fn write_records(
        &mut self,
        cell_id: CellId,
        records: &[OutputRecord],
        schema: &LayerSchema,
    ) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = insert_statement(
            &self.tables.output_schema,
            &self.tables.output_table,
            self.tables.srid,
            schema,
        )?;
        let context = format!("insert shards of cell {}", cell_id);

        let mut tx = self
            .client
            .transaction()
            .map_err(StoreError::query(context.clone()))?;
        let statement = tx
            .prepare(&sql)
            .map_err(StoreError::query(context.clone()))?;

        for record in records {
            let layers = text_array_literal(&record.layer_tags);
            let features = array_literal(&record.feature_ids);
            let n_car = i64::from(record.source_feature_count);
            let flags: Vec<bool> = schema
                .tags()
                .iter()
                .map(|tag| record.per_layer_flag.get(tag).copied().unwrap_or(false))
                .collect();
            let wkt = polygon_to_wkt(&record.geometry);

            let mut params: Vec<&(dyn ToSql + Sync)> = vec![
                &layers,
                &features,
                &record.admin_code,
                &record.state_code,
                &n_car,
            ];
            params.extend(flags.iter().map(|f| f as &(dyn ToSql + Sync)));
            params.push(&record.area_ha);
            params.push(&wkt);

            tx.execute(&statement, &params)
                .map_err(StoreError::query(context.clone()))?;
        }

        tx.commit().map_err(StoreError::query(context))?;
        Ok(records.len())
    }
}
