//! CSV processing: schema detection, streaming cell transformation, and
//! the per-run report.
//!
//! The schema is extracted once from a leading sample window and reused
//! for every row. Output row order always equals input row order, and
//! cancellation is cooperative between rows, never mid-row.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::detect::{DataType, Detector};
use crate::engine::Transformer;
use crate::error::Error;
use crate::profile::Profile;

/// Rows sampled for schema detection.
pub const SAMPLE_ROWS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    pub confidence: f32,
}

#[derive(Debug, Serialize)]
pub struct CellError {
    pub row: u64,
    pub column: String,
    pub message: String,
}

/// Outcome of one processed file.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub rows_processed: u64,
    pub cells_transformed: u64,
    pub cells_passed_through: u64,
    pub schema: Vec<ColumnSchema>,
    pub columns_anonymized: Vec<String>,
    /// Per-cell failures that degraded to the original value.
    pub errors: Vec<CellError>,
    pub cancelled: bool,
}

/// One preview row: original cells next to their anonymized versions.
#[derive(Debug, Serialize)]
pub struct PreviewRow {
    pub original: Vec<String>,
    pub anonymized: Vec<String>,
}

pub struct Processor {
    transformer: Transformer,
    detector: Detector,
    columns: Option<Vec<String>>,
    type_overrides: HashMap<String, DataType>,
    cancel: Arc<AtomicBool>,
}

impl Processor {
    pub fn new(profile: &Profile, transformer: Transformer) -> Self {
        Self {
            transformer,
            detector: Detector::new(),
            columns: profile.columns.clone(),
            type_overrides: profile.type_overrides.clone(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between rows; set it from another thread (or a
    /// signal handler) to stop after the current row.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Detect the schema from the file's leading sample window.
    pub fn extract_schema(&mut self, input: &Path) -> Result<Vec<ColumnSchema>> {
        let file = File::open(input)
            .with_context(|| format!("Cannot open input file: {}", input.display()))?;
        let mut reader = csv::Reader::from_reader(file);
        let headers: Vec<String> = reader
            .headers()
            .context("Cannot read CSV headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut samples: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in reader.records().take(SAMPLE_ROWS) {
            let record = record.context("Cannot read CSV record")?;
            for (i, cell) in record.iter().enumerate() {
                if i < samples.len() && !cell.trim().is_empty() {
                    samples[i].push(cell.to_string());
                }
            }
        }

        let schema = headers
            .iter()
            .zip(samples.iter())
            .map(|(name, column_samples)| {
                let override_type = self.type_overrides.get(name).copied();
                let (data_type, confidence) =
                    self.detector.detect(name, column_samples, override_type);
                debug!(column = %name, %data_type, confidence, "detected column type");
                ColumnSchema {
                    name: name.clone(),
                    data_type,
                    confidence,
                }
            })
            .collect();
        Ok(schema)
    }

    /// Columns that will actually be anonymized for a given schema.
    fn selected_columns(&self, schema: &[ColumnSchema]) -> Vec<String> {
        match &self.columns {
            Some(requested) => schema
                .iter()
                .filter(|c| requested.contains(&c.name))
                .map(|c| c.name.clone())
                .collect(),
            None => schema.iter().map(|c| c.name.clone()).collect(),
        }
    }

    /// Anonymize `input` into `output`, streaming row by row.
    pub fn process_file(&mut self, input: &Path, output: &Path) -> Result<RunReport> {
        let schema = self.extract_schema(input)?;
        let selected = self.selected_columns(&schema);
        let types: HashMap<String, DataType> = schema
            .iter()
            .map(|c| (c.name.clone(), c.data_type))
            .collect();

        let infile = File::open(input)
            .with_context(|| format!("Cannot open input file: {}", input.display()))?;
        let mut reader = csv::Reader::from_reader(infile);
        let headers = reader.headers()?.clone();

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let outfile = File::create(output)
            .with_context(|| format!("Cannot create output file: {}", output.display()))?;
        let mut writer = csv::Writer::from_writer(outfile);
        writer.write_record(&headers)?;

        let mut report = RunReport {
            schema,
            columns_anonymized: selected.clone(),
            ..RunReport::default()
        };

        for (row_idx, record) in reader.records().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                report.cancelled = true;
                break;
            }
            let record = record.context("Cannot read CSV record")?;
            let row = self.process_record(&headers, &record, &types, row_idx as u64, &mut report)?;
            writer.write_record(&row)?;
            report.rows_processed += 1;
        }
        writer.flush()?;
        Ok(report)
    }

    /// Side-by-side preview of the first `limit` rows. Transformations
    /// run through the normal engine path, so vault-backed mappings are
    /// identical to a later full run.
    pub fn preview(&mut self, input: &Path, limit: usize) -> Result<(Vec<String>, Vec<PreviewRow>)> {
        let schema = self.extract_schema(input)?;
        let selected = self.selected_columns(&schema);
        let types: HashMap<String, DataType> = schema
            .iter()
            .map(|c| (c.name.clone(), c.data_type))
            .collect();

        let infile = File::open(input)?;
        let mut reader = csv::Reader::from_reader(infile);
        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows = Vec::new();
        for record in reader.records().take(limit) {
            let record = record?;
            let original: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            let mut anonymized = Vec::with_capacity(original.len());
            for (i, cell) in original.iter().enumerate() {
                let column = headers.get(i).map(String::as_str).unwrap_or("");
                if selected.iter().any(|s| s == column) && !cell.trim().is_empty() {
                    let data_type = types.get(column).copied().unwrap_or(DataType::FreeText);
                    match self.transformer.transform(Some(cell.as_str()), data_type, column) {
                        Ok(Some(v)) => anonymized.push(v),
                        Ok(None) => anonymized.push(cell.clone()),
                        Err(_) => anonymized.push(cell.clone()),
                    }
                } else {
                    anonymized.push(cell.clone());
                }
            }
            rows.push(PreviewRow {
                original,
                anonymized,
            });
        }
        Ok((headers, rows))
    }

    fn process_record(
        &self,
        headers: &csv::StringRecord,
        record: &csv::StringRecord,
        types: &HashMap<String, DataType>,
        row_idx: u64,
        report: &mut RunReport,
    ) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(record.len());
        for (i, cell) in record.iter().enumerate() {
            let column = headers.get(i).unwrap_or("");
            let selected = report.columns_anonymized.iter().any(|s| s == column);
            if !selected {
                out.push(cell.to_string());
                continue;
            }
            if cell.trim().is_empty() {
                report.cells_passed_through += 1;
                out.push(cell.to_string());
                continue;
            }
            let data_type = types.get(column).copied().unwrap_or(DataType::FreeText);
            match self.transformer.transform(Some(cell), data_type, column) {
                Ok(Some(value)) => {
                    report.cells_transformed += 1;
                    out.push(value);
                }
                Ok(None) => {
                    report.cells_passed_through += 1;
                    out.push(cell.to_string());
                }
                // Vault loss is fatal: reversible sessions must not emit
                // rows whose mappings were never recorded.
                Err(e @ Error::VaultUnavailable(_)) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("row {} column {}", row_idx + 1, column)));
                }
                Err(e) => {
                    report.errors.push(CellError {
                        row: row_idx + 1,
                        column: column.to_string(),
                        message: e.to_string(),
                    });
                    report.cells_passed_through += 1;
                    out.push(cell.to_string());
                }
            }
        }
        Ok(out)
    }
}
