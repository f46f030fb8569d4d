//! Enrichment stage: shard attributes for the output table.

use geo::{Area, BoundingRect};
use std::fmt;
use std::str::FromStr;

use crate::geometry::TransverseMercator;
use crate::log_debug;
use crate::model::{OutputRecord, Shard};
use crate::pipeline::context::CellContext;
use crate::pipeline::error::EnrichmentError;

const SQUARE_METRES_PER_HECTARE: f64 = 10_000.0;

/// What to do with a shard that carries no administrative tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingAdminPolicy {
    /// Leave the shard out of the output
    #[default]
    Drop,
    /// Write it with NULL administrative and state codes
    Keep,
    /// Fail the whole cell
    Fail,
}

impl fmt::Display for MissingAdminPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingAdminPolicy::Drop => write!(f, "drop"),
            MissingAdminPolicy::Keep => write!(f, "keep"),
            MissingAdminPolicy::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for MissingAdminPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drop" => Ok(MissingAdminPolicy::Drop),
            "keep" => Ok(MissingAdminPolicy::Keep),
            "fail" => Ok(MissingAdminPolicy::Fail),
            other => Err(format!("unknown policy '{}', expected drop, keep or fail", other)),
        }
    }
}

/// Records produced for a cell and how many shards the policy dropped.
#[derive(Debug, Clone, Default)]
pub struct Enriched {
    pub records: Vec<OutputRecord>,
    pub dropped: usize,
}

/// Leading `digits` decimal digits of an administrative code.
pub fn state_code(code: i64, digits: u32) -> Result<i64, EnrichmentError> {
    let text = code.to_string();
    let invalid = || EnrichmentError::InvalidAdministrativeCode { code, digits };

    if code < 0 || digits == 0 || text.len() < digits as usize {
        return Err(invalid());
    }
    text[..digits as usize].parse().map_err(|_| invalid())
}

/// Turn tagged shards into output records.
///
/// All shards of a cell share one UTM zone: the zone whose central meridian
/// is nearest the cell's longitude midpoint, in the hemisphere of its
/// latitude midpoint.
pub fn enrich(ctx: &CellContext<'_>, shards: &[Shard]) -> Result<Enriched, EnrichmentError> {
    let config = ctx.config;
    let center = ctx
        .cell
        .geometry
        .bounding_rect()
        .map(|r| r.center())
        .ok_or(EnrichmentError::EmptyExtent)?;
    let projection = TransverseMercator::for_midpoint(center.x, center.y);

    let mut enriched = Enriched::default();
    for shard in shards {
        let admin = config
            .administrative_layer_tag
            .as_deref()
            .and_then(|layer| shard.tags.iter().find(|t| t.layer == layer))
            .map(|t| t.feature_id);

        let (admin_code, state) = match admin {
            Some(code) => (Some(code), Some(state_code(code, config.state_code_digits)?)),
            None => match config.missing_administrative {
                MissingAdminPolicy::Drop => {
                    enriched.dropped += 1;
                    continue;
                }
                MissingAdminPolicy::Keep => (None, None),
                MissingAdminPolicy::Fail => {
                    return Err(EnrichmentError::MissingAdministrativeTag {
                        local_id: shard.local_id,
                    })
                }
            },
        };

        let source_feature_count = shard
            .tags
            .iter()
            .filter(|t| t.layer == config.count_layer_tag)
            .count() as u32;

        let projected = projection
            .project_polygon(&shard.geometry)
            .map_err(|source| EnrichmentError::Reprojection {
                local_id: shard.local_id,
                source,
            })?;
        let area_ha = projected.unsigned_area() / SQUARE_METRES_PER_HECTARE;

        enriched.records.push(OutputRecord {
            layer_tags: shard.tags.iter().map(|t| t.layer.clone()).collect(),
            feature_ids: shard.tags.iter().map(|t| t.feature_id).collect(),
            admin_code,
            state_code: state,
            source_feature_count,
            per_layer_flag: ctx.schema.flags_for(shard),
            area_ha,
            geometry: shard.geometry.clone(),
        });
    }

    if enriched.dropped > 0 {
        log_debug!(
            ctx.logger,
            "cell {}: dropped {} shard(s) without administrative tag",
            ctx.cell.id,
            enriched.dropped
        );
    }
    Ok(enriched)
}
