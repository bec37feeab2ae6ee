//! Tabular source: parses the partner CSV export into keyed rows.

use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while loading the CSV export. All of these are fatal to the
/// run; a file that does not match the configured shape is not reconciled.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("CSV input is empty")]
    Empty,

    #[error("CSV input has only a header row")]
    HeaderOnly,

    #[error("CSV header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch { expected: Vec<String>, found: Vec<String> },

    #[error("malformed CSV input: {0}")]
    Malformed(#[from] csv::Error),
}

/// One data row from the export, keyed by header name.
///
/// `index` is 1-based and counts data rows only, matching how the rows are
/// reported back to whoever owns the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub index: usize,
    values: HashMap<String, String>,
}

impl Row {
    /// Returns the raw cell text for a column, untrimmed.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }
}

/// Parses raw CSV text into rows, validating the header row against the
/// expected ordered header list. Cell values pass through unchanged.
pub fn parse_rows(text: &str, expected_headers: &[String]) -> Result<Vec<Row>, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }

    if records.is_empty() {
        return Err(SheetError::Empty);
    }
    if records.len() == 1 {
        return Err(SheetError::HeaderOnly);
    }

    let found: Vec<String> = records[0].iter().map(str::to_string).collect();
    if found.as_slice() != expected_headers {
        return Err(SheetError::HeaderMismatch {
            expected: expected_headers.to_vec(),
            found,
        });
    }

    let rows = records[1..]
        .iter()
        .enumerate()
        .map(|(i, record)| Row {
            index: i + 1,
            values: expected_headers
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect(),
        })
        .collect();

    Ok(rows)
}
