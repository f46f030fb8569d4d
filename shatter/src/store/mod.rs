//! Storage backends: grid source, candidate provider and result sink.
//!
//! The pipeline only sees the traits in [`traits`]. Two backends implement
//! them:
//!
//! - [`postgis`]: a PostgreSQL/PostGIS database reached with the synchronous
//!   `postgres` client, geometries exchanged as WKT
//! - [`file`]: newline-delimited JSON inputs held in memory behind an R-tree,
//!   one NDJSON output file per cell
//!
//! Workers never share a connection; each cell acquires one from the
//! [`ConnectionFactory`] and drops it when the cell is done.

mod codec;
mod error;
mod file;
mod postgis;
mod sql;
mod traits;

pub use codec::{parse_geometry, parse_multipolygon, parse_polygon, polygon_to_wkt};
pub use error::StoreError;
pub use file::{read_output, FileStore, FileStoreFactory, OutputRow};
pub use postgis::{PostgisFactory, PostgisStore, PostgisTables};
pub use sql::{array_literal, output_table_ddl, validate_identifier};
pub use traits::{
    CandidateProvider, ConnectionFactory, GridSource, ResultSink, StoreConnection,
};

use std::fmt;
use std::str::FromStr;

/// Which storage backend a job talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgreSQL with PostGIS
    Postgis,
    /// Newline-delimited JSON files on disk
    File,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Postgis => write!(f, "postgis"),
            StoreBackend::File => write!(f, "file"),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgis" | "postgres" => Ok(StoreBackend::Postgis),
            "file" | "ndjson" => Ok(StoreBackend::File),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("postgis".parse::<StoreBackend>(), Ok(StoreBackend::Postgis));
        assert_eq!("FILE".parse::<StoreBackend>(), Ok(StoreBackend::File));
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_backend_display_round_trips() {
        for backend in [StoreBackend::Postgis, StoreBackend::File] {
            assert_eq!(backend.to_string().parse::<StoreBackend>(), Ok(backend));
        }
    }
}
