//! The `cloak schema` command: show detected column types.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::engine::Transformer;
use crate::output::Output;
use crate::processor::{ColumnSchema, Processor};

use super::effective_profile;

#[derive(Serialize)]
struct SchemaResponse<'a> {
    ok: bool,
    input: String,
    schema: &'a [ColumnSchema],
}

pub fn schema(
    config: &Config,
    input: &Path,
    profile_name: Option<&str>,
    out: &Output,
) -> Result<i32> {
    let profile = effective_profile(config, profile_name, None, None, None)?;
    let transformer = Transformer::from_profile(&profile, None);
    let mut processor = Processor::new(&profile, transformer);
    let schema = processor.extract_schema(input)?;

    if out.is_json() {
        out.json(&SchemaResponse {
            ok: true,
            input: input.display().to_string(),
            schema: &schema,
        })?;
        return Ok(crate::exit_codes::SUCCESS);
    }

    out.data(&format!("Schema: {}", input.display()));
    out.data(&"─".repeat(53));
    out.data(&format!("{:<20} {:<12} {}", "column", "type", "confidence"));
    for column in &schema {
        out.data(&format!(
            "{:<20} {:<12} {:.0}%",
            column.name,
            column.data_type.to_string(),
            column.confidence * 100.0
        ));
    }
    Ok(crate::exit_codes::SUCCESS)
}
