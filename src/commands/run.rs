//! The `cloak run` command: anonymize a CSV file end to end.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use crate::config::Config;
use crate::engine::Transformer;
use crate::exit_codes;
use crate::output::Output;
use crate::processor::{Processor, RunReport};
use crate::vault::MappingVault;

use super::{effective_profile, masked_seed, open_vault};

#[derive(Serialize)]
struct RunResponse<'a> {
    ok: bool,
    profile: &'a str,
    mode: String,
    input: String,
    output: String,
    report: &'a RunReport,
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    config: &Config,
    input: &Path,
    output_path: &Path,
    profile_name: Option<&str>,
    mode_override: Option<&str>,
    seed: Option<&str>,
    vault_path: Option<&Path>,
    password: Option<&str>,
    columns: Option<&[String]>,
    out: &Output,
) -> Result<i32> {
    let profile = effective_profile(config, profile_name, mode_override, seed, columns)?;

    let vault = resolve_vault(config, &profile, vault_path, password, out)?;

    out.info(&format!(
        "Anonymizing {} -> {}",
        input.display(),
        output_path.display()
    ));
    out.info(&format!(
        "  Profile: {} (mode: {}, seed: {})",
        profile.name,
        profile.mode,
        masked_seed(profile.seed.as_deref())
    ));
    if profile.seed.is_none() {
        out.warn(&format!(
            "{}",
            "Warning: no seed set; outputs will differ between runs.".yellow()
        ));
    }

    let transformer = Transformer::from_profile(&profile, vault);
    let mut processor = Processor::new(&profile, transformer);
    let report = processor.process_file(input, output_path)?;

    if out.is_json() {
        out.json(&RunResponse {
            ok: true,
            profile: &profile.name,
            mode: profile.mode.to_string(),
            input: input.display().to_string(),
            output: output_path.display().to_string(),
            report: &report,
        })?;
    } else {
        print_summary(&report, out);
        out.data(&format!(
            "{}",
            format!("Anonymized output saved: {}", output_path.display()).green()
        ));
    }

    if report.errors.is_empty() {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::WARNING)
    }
}

/// A vault is attached for reversible, non-synthetic sessions when a
/// path is available from the CLI or config.
fn resolve_vault(
    config: &Config,
    profile: &crate::profile::Profile,
    vault_path: Option<&Path>,
    password: Option<&str>,
    out: &Output,
) -> Result<Option<Arc<MappingVault>>> {
    if !profile.mode.reversible() || profile.fully_synthetic {
        return Ok(None);
    }
    let path = match vault_path {
        Some(p) => Some(p.to_path_buf()),
        None => config.vault_path().map(std::path::PathBuf::from),
    };
    match path {
        Some(path) => Ok(Some(open_vault(&path, password, out)?)),
        None => {
            out.warn(&format!(
                "{}",
                "Warning: no vault configured; mappings will not be reversible.".yellow()
            ));
            Ok(None)
        }
    }
}

fn print_summary(report: &RunReport, out: &Output) {
    out.info("");
    out.info("Detected schema:");
    for column in &report.schema {
        out.info(&format!(
            "  {:<20} {:<12} ({:.0}%)",
            column.name,
            column.data_type.to_string(),
            column.confidence * 100.0
        ));
    }
    out.info("");
    out.info(&format!(
        "Summary: {} rows, {} cells anonymized, {} passed through",
        report.rows_processed, report.cells_transformed, report.cells_passed_through
    ));
    if report.cancelled {
        out.warn(&format!("{}", "Run was cancelled between rows.".yellow()));
    }
    if !report.errors.is_empty() {
        out.warn(&format!(
            "{}",
            format!(
                "{} cells could not be transformed and were passed through unchanged.",
                report.errors.len()
            )
            .yellow()
        ));
        for error in report.errors.iter().take(5) {
            out.verbose(&format!(
                "  row {} column {}: {}",
                error.row, error.column, error.message
            ));
        }
    }
}
