//! shatter - per-cell polygon shard decomposition
//!
//! Splits a reference grid into topologically clean, non-overlapping
//! "shards": for every grid cell the boundaries of all overlapping source
//! polygons are noded together, polygonized, and each resulting face is
//! tagged with the source features covering it and enriched with area and
//! administrative attributes.
//!
//! # High-Level API
//!
//! ```ignore
//! use shatter::config::ConfigFile;
//! use shatter::log::TracingLogger;
//! use shatter::orchestrator::{open_factory, run_job, CellSelection, JobConfig};
//! use std::sync::Arc;
//!
//! let config = ConfigFile::load()?;
//! config.validate()?;
//! let factory = open_factory(&config)?;
//! let job = JobConfig::from_config(&config, CellSelection::All);
//! let summary = run_job(&job, factory.as_ref(), Arc::new(TracingLogger))?;
//! println!("{}", summary);
//! ```
//!
//! For a single cell without any store, see [`pipeline::shatter_cell`].

pub mod config;
pub mod geometry;
pub mod log;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod panic;
pub mod pipeline;
pub mod store;

/// Version of the shatter library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
