//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`run`] - Run a decomposition job
//! - [`schema`] - Print or apply the output table DDL

pub mod run;
pub mod schema;
