//! Data models for partner products, variants, and stock tiers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A product as returned by the partner catalog API.
///
/// Built fresh on every lookup; nothing is cached across rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub description: String,
    pub variants: Vec<Variant>,
}

impl Product {
    /// Returns the first variant whose name matches exactly.
    pub fn variant_named(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    /// Returns a name-indexed view of the variants. Duplicate names are
    /// last-write-wins.
    pub fn variant_map(&self) -> HashMap<&str, &Variant> {
        self.variants.iter().map(|v| (v.name.as_str(), v)).collect()
    }
}

/// A purchasable variant with its own price and stock count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant name, unique within a product in well-formed data
    #[serde(rename = "variants_name")]
    pub name: String,
    /// Whole currency units, no minor-unit scaling
    pub price: i64,
    /// Raw stock count; the partner has been seen sending negatives
    pub stock: i64,
}

impl Variant {
    /// True iff the previously recorded price differs from the live price.
    /// Exact integer equality, no tolerance.
    pub fn price_changed(&self, old_price: i64) -> bool {
        old_price != self.price
    }

    /// Buckets the live stock count into a tier.
    pub fn stock_tier(&self) -> StockTier {
        if self.stock < 5 {
            StockTier::OutOfStock
        } else if self.stock < 20 {
            StockTier::LowStock
        } else {
            StockTier::HighStock
        }
    }

    /// True iff the previously recorded tier ordinal differs from the tier
    /// derived from the live stock count.
    pub fn stock_tier_changed(&self, old_tier: i64) -> bool {
        old_tier != self.stock_tier().ordinal()
    }
}

/// Coarse stock bucket derived from a raw stock count.
///
/// Never stored; recomputed from `Variant::stock` on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTier {
    OutOfStock,
    LowStock,
    HighStock,
}

impl StockTier {
    /// Ordinal used by the spreadsheet's stock-level column.
    pub fn ordinal(self) -> i64 {
        match self {
            StockTier::OutOfStock => 0,
            StockTier::LowStock => 1,
            StockTier::HighStock => 2,
        }
    }
}

impl std::fmt::Display for StockTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockTier::OutOfStock => write!(f, "out of stock"),
            StockTier::LowStock => write!(f, "low stock"),
            StockTier::HighStock => write!(f, "high stock"),
        }
    }
}
