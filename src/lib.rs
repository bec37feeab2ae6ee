//! partner-recon - Batch price/stock reconciliation for partner catalog feeds.
//!
//! Reconciles a locally-held CSV price/stock export against live data from a
//! partner's HTTP catalog API, logging a finding for every discrepancy.

pub mod config;
pub mod partner;
pub mod recon;
pub mod sheet;

pub use config::{Columns, Config};
pub use partner::client::{Catalog, PartnerClient, PartnerError};
pub use partner::models::{Product, StockTier, Variant};
pub use recon::checker::{Finding, Reconciler, RunSummary};
