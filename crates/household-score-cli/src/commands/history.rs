use clap::Args;
use serde_json::{json, Value};

use super::Context;
use crate::input;

/// Arguments for importing an external table
#[derive(Args)]
pub struct ImportArgs {
    /// CSV table whose header names every history column
    #[arg(long)]
    pub file: String,
}

pub fn run_import(args: ImportArgs, ctx: &Context) -> Result<Value, Box<dyn std::error::Error>> {
    let (headers, rows) = input::file::read_csv_table(&args.file)?;
    let written = ctx.history.append_table(&headers, &rows)?;
    tracing::info!(rows = written, file = %args.file, "imported table");
    Ok(json!({
        "message": format!("Imported {written} rows."),
        "result": {
            "rows": written,
            "path": ctx.history.path().display().to_string(),
        },
    }))
}
