//! Which cells a job runs.

use std::collections::HashSet;
use std::path::PathBuf;

use super::ledger::{read_ledger, rotate_ledger};
use super::JobError;
use crate::model::CellId;
use crate::store::{GridSource, StoreConnection};

/// Cell selection for a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CellSelection {
    /// Every cell of the grid
    #[default]
    All,
    /// An explicit list, in the given order
    Explicit(Vec<CellId>),
    /// The ids recorded in a failure ledger. The ledger is rotated aside
    /// first so the rerun records its own failures in a fresh file.
    Ledger(PathBuf),
}

impl CellSelection {
    /// Resolve to concrete ids, deduplicated in first-seen order.
    pub fn resolve(&self, conn: &mut dyn StoreConnection) -> Result<Vec<CellId>, JobError> {
        let ids = match self {
            CellSelection::All => conn.list_cell_ids()?,
            CellSelection::Explicit(ids) => ids.clone(),
            CellSelection::Ledger(path) => {
                let rotated = rotate_ledger(path).map_err(|source| JobError::Ledger {
                    path: path.clone(),
                    source,
                })?;
                read_ledger(&rotated).map_err(|source| JobError::Ledger {
                    path: rotated.clone(),
                    source,
                })?
            }
        };

        let mut seen = HashSet::with_capacity(ids.len());
        Ok(ids.into_iter().filter(|id| seen.insert(*id)).collect())
    }
}

/// Parse a comma separated cell id list such as `18,19, 27`.
pub fn parse_cell_list(text: &str) -> Result<Vec<CellId>, String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<CellId>().map_err(|_| format!("'{}' is not a cell id", s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell_list() {
        assert_eq!(parse_cell_list("18, 19,27,"), Ok(vec![18, 19, 27]));
        assert_eq!(parse_cell_list(""), Ok(vec![]));
        assert!(parse_cell_list("18,x").is_err());
    }
}
