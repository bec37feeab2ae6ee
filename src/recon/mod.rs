//! Reconciliation core: row checking and numeric cell parsing.

pub mod checker;
pub mod parse;

pub use checker::{Finding, Reconciler, RowError, RunSummary};
pub use parse::{parse_currency, parse_stock_tier, ParseError};
