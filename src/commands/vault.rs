//! Vault commands: statistics, key export, and reverse lookup.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;

use crate::output::Output;

use super::open_vault;

#[derive(Serialize)]
struct ReverseResponse<'a> {
    ok: bool,
    column: &'a str,
    anonymized: &'a str,
    original: Option<String>,
}

pub fn vault_stats(vault_path: &Path, password: Option<&str>, out: &Output) -> Result<i32> {
    let vault = open_vault(vault_path, password, out)?;
    let stats = vault.statistics().context("Cannot read vault statistics")?;

    if out.is_json() {
        out.json(&stats)?;
        return Ok(crate::exit_codes::SUCCESS);
    }

    out.data(&format!("Vault: {}", vault_path.display()));
    out.data(&"─".repeat(53));
    out.data(&format!("Total mappings: {}", stats.total));
    if !stats.per_type.is_empty() {
        out.data("");
        out.data("By data type:");
        for (data_type, count) in &stats.per_type {
            out.data(&format!("  {:<16} {}", data_type, count));
        }
    }
    if !stats.per_column.is_empty() {
        out.data("");
        out.data("By column:");
        for (column, count) in &stats.per_column {
            out.data(&format!("  {:<16} {}", column, count));
        }
    }
    if !stats.weak_uniqueness.is_empty() {
        out.warn(&format!(
            "{}",
            format!(
                "Weak uniqueness (collision retries exhausted): {}",
                stats.weak_uniqueness.join(", ")
            )
            .yellow()
        ));
    }
    Ok(crate::exit_codes::SUCCESS)
}

pub fn vault_export_key(
    vault_path: &Path,
    password: Option<&str>,
    export_path: &Path,
    out: &Output,
) -> Result<i32> {
    let vault = open_vault(vault_path, password, out)?;
    vault
        .export_key(export_path)
        .with_context(|| format!("Cannot export key to {}", export_path.display()))?;
    out.data(&format!(
        "{}",
        format!("Key exported: {}", export_path.display()).green()
    ));
    out.warn("The key file grants access to every stored mapping. Store it separately from the vault.");
    Ok(crate::exit_codes::SUCCESS)
}

#[allow(clippy::too_many_arguments)]
pub fn reverse(
    vault_path: &Path,
    password: Option<&str>,
    key_file: Option<&Path>,
    column: &str,
    anonymized: &str,
    seed: Option<&str>,
    out: &Output,
) -> Result<i32> {
    let vault = open_vault(vault_path, password, out)?;
    if let Some(key_path) = key_file {
        vault
            .load_key(key_path)
            .with_context(|| format!("Cannot load key file: {}", key_path.display()))?;
    }

    let original = vault
        .reverse(anonymized, column, seed)
        .context("Reverse lookup failed")?;

    if out.is_json() {
        out.json(&ReverseResponse {
            ok: original.is_some(),
            column,
            anonymized,
            original: original.clone(),
        })?;
        return Ok(if original.is_some() {
            crate::exit_codes::SUCCESS
        } else {
            crate::exit_codes::WARNING
        });
    }

    match original {
        Some(value) => {
            out.data(&value);
            Ok(crate::exit_codes::SUCCESS)
        }
        None => {
            out.warn("No mapping found (wrong column, wrong key, or never anonymized).");
            Ok(crate::exit_codes::WARNING)
        }
    }
}
