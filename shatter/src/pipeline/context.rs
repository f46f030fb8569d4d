//! Settings and per-cell context threaded through the stages.
//!
//! There is no pipeline object holding state between stages: each stage
//! function takes a [`CellContext`] plus the previous stage's output and
//! returns its own result.

use crate::config::{
    ConfigFile, DEFAULT_COUNT_LAYER_TAG, DEFAULT_COVERAGE_TOLERANCE, DEFAULT_SNAP_PRECISION,
    DEFAULT_STATE_CODE_DIGITS,
};
use crate::log::Logger;
use crate::model::{GridCell, LayerSchema};

use super::stages::MissingAdminPolicy;

/// Read-only settings shared by every cell of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Layer whose feature id is the administrative (municipality) code
    pub administrative_layer_tag: Option<String>,
    /// Layer whose occurrences are counted per shard
    pub count_layer_tag: String,
    pub missing_administrative: MissingAdminPolicy,
    /// Leading digits of the administrative code forming the state code
    pub state_code_digits: u32,
    /// Noding grid size in coordinate units
    pub snap_precision: f64,
    /// Allowed relative difference between shard and cell area
    pub coverage_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            administrative_layer_tag: None,
            count_layer_tag: DEFAULT_COUNT_LAYER_TAG.to_string(),
            missing_administrative: MissingAdminPolicy::Drop,
            state_code_digits: DEFAULT_STATE_CODE_DIGITS,
            snap_precision: DEFAULT_SNAP_PRECISION,
            coverage_tolerance: DEFAULT_COVERAGE_TOLERANCE,
        }
    }
}

impl From<&ConfigFile> for PipelineConfig {
    fn from(config: &ConfigFile) -> Self {
        Self {
            administrative_layer_tag: config.enrichment.administrative_layer_tag.clone(),
            count_layer_tag: config.enrichment.count_layer_tag.clone(),
            missing_administrative: config.enrichment.missing_administrative,
            state_code_digits: config.enrichment.state_code_digits,
            snap_precision: config.noding.snap_precision,
            coverage_tolerance: config.noding.coverage_tolerance,
        }
    }
}

/// Everything a stage may consult while working on one cell.
#[derive(Clone, Copy)]
pub struct CellContext<'a> {
    pub cell: &'a GridCell,
    pub config: &'a PipelineConfig,
    pub schema: &'a LayerSchema,
    pub logger: &'a dyn Logger,
}

impl<'a> CellContext<'a> {
    pub fn new(
        cell: &'a GridCell,
        config: &'a PipelineConfig,
        schema: &'a LayerSchema,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            cell,
            config,
            schema,
            logger,
        }
    }
}
