//! Numeric parsing for spreadsheet cell text.

use thiserror::Error;

/// A cell that could not be read as a number. Non-fatal: the affected
/// comparison is skipped and the row keeps processing.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot parse {field} value '{value}'")]
pub struct ParseError {
    pub field: &'static str,
    pub value: String,
}

/// Parses a price cell such as `"Rp1,000"` or `"1000"` into whole currency
/// units.
///
/// A leading currency token (any run of non-digit characters) and comma
/// thousands separators are stripped; the remainder must be a plain integer.
pub fn parse_currency(text: &str) -> Result<i64, ParseError> {
    let err = || ParseError { field: "price", value: text.to_string() };

    let start = text
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .ok_or_else(err)?;

    let cleaned: String = text[start..].chars().filter(|&c| c != ',').collect();
    cleaned.parse().map_err(|_| err())
}

/// Parses a stock-tier cell. Strict integer parse, no normalization.
pub fn parse_stock_tier(text: &str) -> Result<i64, ParseError> {
    text.parse()
        .map_err(|_| ParseError { field: "stock tier", value: text.to_string() })
}
