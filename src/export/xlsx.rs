//! XLSX rendering.
//!
//! Writes a single worksheet with a bold header row. Cell types follow the
//! source values: numbers and booleans keep their type, everything else is
//! written as text and NULL cells are left blank.

use crate::db::{QueryResult, Value};
use crate::error::{ExportError, Result};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};

/// Largest integer magnitude a spreadsheet number holds exactly (2^53).
const MAX_EXACT_INT: i64 = 9_007_199_254_740_992;

/// How a value is stored in a worksheet cell.
#[derive(Debug, PartialEq)]
enum Cell {
    Blank,
    Number(f64),
    Bool(bool),
    Text(String),
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Blank,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Int(i) if (-MAX_EXACT_INT..=MAX_EXACT_INT).contains(i) => {
                Cell::Number(*i as f64)
            }
            Value::Float(f) if f.is_finite() => Cell::Number(*f),
            other => Cell::Text(other.to_export_string()),
        }
    }
}

/// Renders the result set into an in-memory workbook.
pub fn render(result: &QueryResult) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    for (col, column) in result.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col_num(col)?, &column.name, &header)
            .map_err(xlsx_error)?;
    }

    for (index, row) in result.rows.iter().enumerate() {
        let row_num = row_num(index + 1)?;
        for (col, value) in row.iter().enumerate() {
            write_cell(worksheet, row_num, col_num(col)?, &Cell::from(value))?;
        }
    }

    workbook.save_to_buffer().map_err(xlsx_error)
}

fn write_cell(worksheet: &mut Worksheet, row: RowNum, col: ColNum, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Blank => return Ok(()),
        Cell::Number(n) => worksheet.write_number(row, col, *n),
        Cell::Bool(b) => worksheet.write_boolean(row, col, *b),
        Cell::Text(s) => worksheet.write_string(row, col, s),
    }
    .map_err(xlsx_error)?;
    Ok(())
}

fn row_num(index: usize) -> Result<RowNum> {
    RowNum::try_from(index)
        .map_err(|_| ExportError::serialize(format!("Row {index} exceeds the XLSX row limit")))
}

fn col_num(index: usize) -> Result<ColNum> {
    ColNum::try_from(index).map_err(|_| {
        ExportError::serialize(format!("Column {index} exceeds the XLSX column limit"))
    })
}

fn xlsx_error(error: XlsxError) -> ExportError {
    ExportError::serialize(format!("Failed to write XLSX: {error}"))
}
