//! CSV loading for transaction tables.

use crate::error::{AnalyticsError, Result};
use std::path::Path;

/// Minimum number of columns a usable transaction table must have
/// (date, customer id, category, amount).
pub const MIN_COLUMNS: usize = 4;

/// A raw tabular dataset as loaded from CSV, before any role assignment.
///
/// Cells are kept as text; typing happens during normalization once the
/// caller has declared which column plays which role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Build a table from headers and rows. Rows shorter than the header are
    /// rejected; CSV readers normally guarantee this already.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headers.len() < MIN_COLUMNS {
            return Err(AnalyticsError::Parse(format!(
                "dataset must have at least {} columns, found {}",
                MIN_COLUMNS,
                headers.len()
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(AnalyticsError::Parse(format!(
                    "row {} has {} cells, expected {}",
                    i + 1,
                    row.len(),
                    headers.len()
                )));
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AnalyticsError::MissingColumn(name.to_string()))
    }
}

/// Load a transaction table from a CSV file.
///
/// The file is decoded as UTF-8 when possible, falling back to Latin-1
/// otherwise (Latin-1 bytes map one-to-one onto Unicode scalars).
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let bytes = std::fs::read(path)?;
    load_csv_bytes(&bytes)
}

/// Load a transaction table from raw CSV bytes.
pub fn load_csv_bytes(bytes: &[u8]) -> Result<RawTable> {
    let text = decode_text(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    RawTable::new(headers, rows)
}

/// Decode bytes as UTF-8, or as Latin-1 if the bytes are not valid UTF-8.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
