//! CSV rendering.

use crate::db::{QueryResult, Value};
use crate::error::{ExportError, Result};
use csv::Writer;

/// Renders a header record followed by one record per row.
///
/// Fields containing delimiters, quotes or line breaks are quoted by the
/// `csv` writer; NULL is written as an empty field.
pub fn render(result: &QueryResult) -> Result<Vec<u8>> {
    let mut writer = Writer::from_writer(Vec::new());

    if !result.columns.is_empty() {
        writer
            .write_record(result.column_names())
            .map_err(|e| ExportError::serialize(format!("Failed to write CSV header: {e}")))?;
    }

    for row in &result.rows {
        writer
            .write_record(row.iter().map(Value::to_export_string))
            .map_err(|e| ExportError::serialize(format!("Failed to write CSV record: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::serialize(format!("Failed to flush CSV writer: {e}")))
}
