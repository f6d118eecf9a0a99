//! Raw table readers for the source datasets.
//!
//! Both sources are reduced to a [`RawTable`] of header strings and cell
//! strings; column meaning is resolved later by [`crate::normalize::schema`].

use crate::error::{Result, require_input};
use calamine::{Data, Reader, open_workbook_auto};
use std::path::Path;
use tracing::debug;

/// Untyped rows exactly as read, one `String` per cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Cell `col` of `row`, or `""` for short rows.
    pub fn cell<'a>(row: &'a [String], col: usize) -> &'a str {
        row.get(col).map(String::as_str).unwrap_or("")
    }
}

/// Reads a table from `path`, picking the reader from the file extension.
///
/// # Errors
///
/// Returns [`crate::error::PipelineError::MissingInput`] if the file does not
/// exist, or a read error if it is not a valid table.
pub fn load_table(path: &Path) -> Result<RawTable> {
    require_input(path)?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let table = match ext.as_deref() {
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => read_spreadsheet(path)?,
        _ => read_csv(path)?,
    };

    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "Raw table loaded"
    );
    Ok(table)
}

/// Reads a delimited file with a header row.
pub fn read_csv(path: &Path) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_path(path)?;

    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable::new(headers, rows))
}

/// Reads the first worksheet of a workbook; its first row is the header.
pub fn read_spreadsheet(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Ok(RawTable::default()),
    };

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header_row) => header_row.iter().map(cell_to_string).collect(),
        None => return Ok(RawTable::default()),
    };
    let rows = rows.map(|row| row.iter().map(cell_to_string).collect()).collect();

    Ok(RawTable::new(headers, rows))
}

/// Date cells become ISO dates so they parse like text dates downstream.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.clone(),
        other => other.to_string(),
    }
}
