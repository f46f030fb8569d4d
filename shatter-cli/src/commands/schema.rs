//! Schema command - show or create the output table.
//!
//! The layer columns are negotiated exactly as a job would negotiate them,
//! so the printed DDL is the table the next `run` writes into.

use std::path::PathBuf;

use shatter::orchestrator::{negotiate_schema, open_factory};
use shatter::store::output_table_ddl;

use crate::error::CliError;
use crate::runner::load_config;

/// Arguments for the schema command.
#[derive(Debug, Default)]
pub struct SchemaArgs {
    pub config: Option<PathBuf>,
    pub apply: bool,
}

/// Run the schema command.
pub fn run(args: SchemaArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let factory = open_factory(&config)?;
    let mut conn = factory.connect()?;
    let layers = negotiate_schema(&config.layers.tags, conn.as_mut())?;

    if args.apply {
        conn.prepare_output(&layers)?;
        println!(
            "Prepared output for {} layer(s) on {}",
            layers.len(),
            factory.describe()
        );
        return Ok(());
    }

    let statements = output_table_ddl(
        &config.output.schema,
        &config.output.table,
        config.output.srid,
        &layers,
    )?;
    for statement in statements {
        println!("{};", statement);
    }
    Ok(())
}
