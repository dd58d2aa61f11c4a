//! Export pipeline.
//!
//! Runs a query through a database session and writes the result set to
//! `<output_dir>/<table_name>.<ext>` as CSV, XLSX or JSON. Files are written
//! to a temporary file in the target directory and renamed into place, so a
//! failed export never leaves a truncated file behind.

mod csv;
mod json;
mod xlsx;

use crate::db::{DatabaseClient, QueryResult};
use crate::error::{ExportError, Result};
use crate::persistence::PresetQuery;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Supported export formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    /// All formats, in menu order.
    pub const ALL: [ExportFormat; 3] = [Self::Csv, Self::Xlsx, Self::Json];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Json => "json",
        }
    }

    /// Returns the menu label for this format.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Xlsx => "XLSX",
            Self::Json => "JSON",
        }
    }

    /// Maps a 1-based menu choice to a format.
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        let index: usize = choice.trim().parse().ok()?;
        index
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    /// Serializes a result set into the bytes of an export file.
    pub fn render(&self, result: &QueryResult) -> Result<Vec<u8>> {
        match self {
            Self::Csv => csv::render(result),
            Self::Xlsx => xlsx::render(result),
            Self::Json => json::render(result),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid export format: {s}. Expected: csv, xlsx, or json"
            )),
        }
    }
}

/// Summary of a single completed export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    /// Table name the export was requested for.
    pub table_name: String,
    /// File that was written.
    pub path: PathBuf,
    /// Format the file was written in.
    pub format: ExportFormat,
    /// Number of data records written (header excluded).
    pub row_count: usize,
    /// Number of fields per record.
    pub column_count: usize,
}

/// Result of exporting several queries in one go.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Exports that completed.
    pub exported: Vec<ExportOutcome>,
    /// Queries that were skipped, with the error that caused it.
    pub failed: Vec<(String, ExportError)>,
}

impl BatchReport {
    /// Returns true if every query was exported.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Executes queries through a database session and writes the results to disk.
pub struct ExportEngine<'a> {
    db: &'a dyn DatabaseClient,
}

impl<'a> ExportEngine<'a> {
    /// Creates an engine bound to a database session.
    pub fn new(db: &'a dyn DatabaseClient) -> Self {
        Self { db }
    }

    /// Exports the result of `query` to `output_dir/<table_name>.<ext>`.
    ///
    /// The output directory is created if it does not exist.
    pub async fn export_table_data(
        &self,
        table_name: &str,
        query: &str,
        format: ExportFormat,
        output_dir: &Path,
    ) -> Result<ExportOutcome> {
        ensure_output_dir(output_dir)?;
        let path = output_path(output_dir, table_name, format);
        self.export_to_path(table_name, query, format, path).await
    }

    async fn export_to_path(
        &self,
        table_name: &str,
        query: &str,
        format: ExportFormat,
        path: PathBuf,
    ) -> Result<ExportOutcome> {
        let result = self.db.execute_query(query).await?;
        let bytes = format.render(&result)?;
        write_atomically(&path, &bytes)?;

        info!(
            "Exported {} rows from '{}' to {} in {:?}",
            result.row_count,
            table_name,
            path.display(),
            result.execution_time
        );

        Ok(ExportOutcome {
            table_name: table_name.to_string(),
            path,
            format,
            row_count: result.row_count,
            column_count: result.columns.len(),
        })
    }

    /// Exports each query in turn.
    ///
    /// Database and serialization failures skip the offending query and the
    /// batch continues; filesystem failures abort the whole batch.
    ///
    /// Queries sharing a file name get `_2`, `_3`, ... suffixes in batch order,
    /// so no export in the batch overwrites another.
    pub async fn export_batch(
        &self,
        queries: &[PresetQuery],
        format: ExportFormat,
        output_dir: &Path,
    ) -> Result<BatchReport> {
        ensure_output_dir(output_dir)?;

        let stems = batch_file_stems(queries);
        let mut report = BatchReport::default();
        for (query, stem) in queries.iter().zip(&stems) {
            let path = output_dir.join(format!("{}.{}", stem, format.extension()));
            match self
                .export_to_path(&query.table_name, &query.sql, format, path)
                .await
            {
                Ok(outcome) => report.exported.push(outcome),
                Err(e) if e.skips_query() => {
                    warn!("Skipping export of '{}': {}", query.table_name, e);
                    report.failed.push((query.table_name.clone(), e));
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}

/// Returns the path an export of `table_name` in `format` is written to.
pub fn output_path(output_dir: &Path, table_name: &str, format: ExportFormat) -> PathBuf {
    output_dir.join(format!(
        "{}.{}",
        sanitize_file_stem(table_name),
        format.extension()
    ))
}

/// Makes a table name safe to use as a file name.
fn sanitize_file_stem(table_name: &str) -> String {
    let stem: String = table_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.chars().all(|c| c == '.') {
        "export".to_string()
    } else {
        stem
    }
}

/// Assigns each query a distinct file stem.
///
/// Stems are compared case-insensitively so the files stay distinct on
/// case-insensitive filesystems.
fn batch_file_stems(queries: &[PresetQuery]) -> Vec<String> {
    let bases: Vec<String> = queries
        .iter()
        .map(|q| sanitize_file_stem(&q.table_name))
        .collect();
    let originals: HashSet<String> = bases.iter().map(|b| b.to_lowercase()).collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(bases.len());

    bases
        .into_iter()
        .map(|base| {
            let stem = if taken.contains(&base.to_lowercase()) {
                (2..)
                    .map(|n| format!("{base}_{n}"))
                    .find(|s| {
                        let key = s.to_lowercase();
                        !taken.contains(&key) && !originals.contains(&key)
                    })
                    .unwrap_or(base)
            } else {
                base
            };
            taken.insert(stem.to_lowercase());
            stem
        })
        .collect()
}

/// Creates the output directory (and parents) if missing.
pub fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir).map_err(|e| {
        ExportError::io(format!(
            "Cannot create output directory {}: {e}",
            output_dir.display()
        ))
    })
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        ExportError::io(format!("Cannot create file in {}: {e}", dir.display()))
    })?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| ExportError::io(format!("Failed to write {}: {e}", path.display())))?;
    file.persist(path)
        .map_err(|e| ExportError::io(format!("Failed to save {}: {}", path.display(), e.error)))?;

    Ok(())
}
