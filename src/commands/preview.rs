//! The `cloak preview` command: show the first rows side by side.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::config::Config;
use crate::engine::Transformer;
use crate::output::Output;
use crate::processor::{PreviewRow, Processor};

use super::effective_profile;

#[derive(Serialize)]
struct PreviewResponse<'a> {
    ok: bool,
    headers: &'a [String],
    rows: &'a [PreviewRow],
}

#[allow(clippy::too_many_arguments)]
pub fn preview(
    config: &Config,
    input: &Path,
    rows: usize,
    profile_name: Option<&str>,
    mode_override: Option<&str>,
    seed: Option<&str>,
    columns: Option<&[String]>,
    out: &Output,
) -> Result<i32> {
    let profile = effective_profile(config, profile_name, mode_override, seed, columns)?;

    // Preview never attaches a vault: nothing is persisted for a look.
    let transformer = Transformer::from_profile(&profile, None);
    let mut processor = Processor::new(&profile, transformer);
    let (headers, preview_rows) = processor.preview(input, rows)?;

    if out.is_json() {
        out.json(&PreviewResponse {
            ok: true,
            headers: &headers,
            rows: &preview_rows,
        })?;
        return Ok(crate::exit_codes::SUCCESS);
    }

    out.data(&format!("Preview ({} rows, mode: {})", preview_rows.len(), profile.mode));
    out.data(&"─".repeat(53));
    for (i, row) in preview_rows.iter().enumerate() {
        out.data(&format!("Row {}:", i + 1));
        for (j, header) in headers.iter().enumerate() {
            let original = row.original.get(j).map(String::as_str).unwrap_or("");
            let anonymized = row.anonymized.get(j).map(String::as_str).unwrap_or("");
            if original == anonymized {
                out.data(&format!("  {:<16} {}", header, original));
            } else {
                out.data(&format!(
                    "  {:<16} {} {} {}",
                    header,
                    original,
                    "->".dimmed(),
                    anonymized.green()
                ));
            }
        }
        out.data("");
    }

    Ok(crate::exit_codes::SUCCESS)
}
