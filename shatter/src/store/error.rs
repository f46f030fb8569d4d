//! Storage error types.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::CellId;

/// Errors raised by any storage backend.
///
/// Inside a cell these fail only that cell; during job setup they abort the job.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connection could not be established
    #[error("connection failed: {0}")]
    Connection(#[source] postgres::Error),

    /// Query or statement failed
    #[error("{context}: {source}")]
    Query {
        context: String,
        #[source]
        source: postgres::Error,
    },

    /// File could not be read or written
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed NDJSON line
    #[error("invalid record at {}:{line}: {source}", path.display())]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// WKT text could not be parsed
    #[error("invalid WKT: {0}")]
    Wkt(String),

    /// Geometry had the wrong type
    #[error("expected {expected}, found {found}")]
    UnexpectedGeometry {
        expected: &'static str,
        found: String,
    },

    /// Requested cell does not exist in the grid
    #[error("grid cell {0} not found")]
    CellNotFound(CellId),

    /// Table or schema name contains characters outside [A-Za-z0-9_.]
    #[error("invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    /// Backend setting missing
    #[error("missing store setting: {0}")]
    MissingSetting(&'static str),
}

impl StoreError {
    pub(crate) fn query(context: impl Into<String>) -> impl FnOnce(postgres::Error) -> StoreError {
        let context = context.into();
        move |source| StoreError::Query { context, source }
    }

    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }
}
