//! Partner catalog API client and data models.

pub mod client;
pub mod models;

pub use client::{Catalog, PartnerClient, PartnerError};
pub use models::{Product, StockTier, Variant};
