//! Reconciliation run: matches local rows against live partner data.

use crate::config::Columns;
use crate::partner::client::{Catalog, PartnerError};
use crate::recon::parse::{parse_currency, parse_stock_tier};
use crate::sheet::Row;
use anyhow::{Context, Result};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a row's comparisons were skipped. Caught at the row boundary and
/// logged; a bad row never aborts the run.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("row has no '{0}' column")]
    MissingColumn(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] PartnerError),

    #[error("product '{product}' has no variant named '{variant}'")]
    NoVariant { product: String, variant: String },
}

/// A logged observation that remote data diverges from the local snapshot.
///
/// `key` is the row's SKU when a SKU column is configured and filled,
/// otherwise the slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    PriceChanged { row: usize, key: String, old: i64, new: i64 },
    StockTierChanged { row: usize, key: String, old: i64, new: i64 },
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::PriceChanged { row, key, old, new } => {
                write!(f, "row {row}: price changed for {key}: {old} -> {new}")
            }
            Finding::StockTierChanged { row, key, old, new } => {
                write!(f, "row {row}: stock tier changed for {key}: {old} -> {new}")
            }
        }
    }
}

/// Counters for one reconciliation pass. Findings themselves are logged,
/// not collected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows reached before the empty-slug terminator
    pub rows_seen: usize,
    /// Rows whose comparisons ran
    pub rows_checked: usize,
    /// Change findings logged
    pub findings: usize,
    /// Rows whose variant name matched nothing remote
    pub not_found: usize,
    /// Rows skipped on fetch or shape errors
    pub skipped: usize,
}

/// Drives one reconciliation pass over the parsed rows.
///
/// Remote data is ground truth; the rows hold the prior snapshot being
/// checked for staleness.
pub struct Reconciler {
    columns: Columns,
    rows: Vec<Row>,
}

impl Reconciler {
    pub fn new(columns: Columns, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Runs the full pass. Aborts only if login fails; every per-row
    /// failure is logged and the pass moves on to the next row.
    pub async fn run<C: Catalog>(&self, partner: &mut C) -> Result<RunSummary> {
        partner.login().await.context("partner login failed")?;

        let mut summary = RunSummary::default();

        for row in &self.rows {
            let slug = row.get(&self.columns.slug).unwrap_or("");
            if slug.is_empty() {
                // Spreadsheet convention: a blank slug marks the end of
                // real data.
                debug!("row {}: empty slug, stopping", row.index);
                break;
            }
            summary.rows_seen += 1;

            match self.check_row(partner, row, slug).await {
                Ok(findings) => {
                    summary.rows_checked += 1;
                    summary.findings += findings.len();
                    for finding in &findings {
                        warn!("{finding}");
                    }
                }
                Err(RowError::NoVariant { product, variant }) => {
                    summary.not_found += 1;
                    warn!(
                        "row {}: product '{}' has no variant named '{}'",
                        row.index, product, variant
                    );
                }
                Err(err) => {
                    summary.skipped += 1;
                    warn!("row {} ({}): {}", row.index, slug, err);
                }
            }
        }

        info!(
            "checked {} of {} rows: {} findings, {} not found, {} skipped",
            summary.rows_checked,
            summary.rows_seen,
            summary.findings,
            summary.not_found,
            summary.skipped
        );

        Ok(summary)
    }

    /// Checks a single row: fetch, match the variant by name, then compare
    /// price and stock tier. Each comparison whose cell fails to parse is
    /// skipped on its own; the other still runs.
    async fn check_row<C: Catalog>(
        &self,
        partner: &C,
        row: &Row,
        slug: &str,
    ) -> Result<Vec<Finding>, RowError> {
        let product = partner.get_product(slug).await?;

        let wanted = self.cell(row, &self.columns.variant)?;
        let variant = product.variant_named(wanted).ok_or_else(|| RowError::NoVariant {
            product: product.name.clone(),
            variant: wanted.to_string(),
        })?;

        let key = self.row_key(row, slug);
        let mut findings = Vec::new();

        match parse_currency(self.cell(row, &self.columns.price)?) {
            Ok(old_price) => {
                if variant.price_changed(old_price) {
                    findings.push(Finding::PriceChanged {
                        row: row.index,
                        key: key.clone(),
                        old: old_price,
                        new: variant.price,
                    });
                }
            }
            Err(err) => warn!("row {}: {}", row.index, err),
        }

        match parse_stock_tier(self.cell(row, &self.columns.stock)?) {
            Ok(old_tier) => {
                if variant.stock_tier_changed(old_tier) {
                    findings.push(Finding::StockTierChanged {
                        row: row.index,
                        key,
                        old: old_tier,
                        new: variant.stock_tier().ordinal(),
                    });
                }
            }
            Err(err) => warn!("row {}: {}", row.index, err),
        }

        Ok(findings)
    }

    fn cell<'r>(&self, row: &'r Row, column: &str) -> Result<&'r str, RowError> {
        row.get(column).ok_or_else(|| RowError::MissingColumn(column.to_string()))
    }

    fn row_key(&self, row: &Row, slug: &str) -> String {
        self.columns
            .sku
            .as_deref()
            .and_then(|col| row.get(col))
            .filter(|sku| !sku.is_empty())
            .unwrap_or(slug)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partner::models::{Product, Variant};
    use crate::sheet;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Mock partner catalog for testing.
    struct MockCatalog {
        login_ok: bool,
        products: HashMap<String, Product>,
        login_calls: u32,
        fetch_calls: AtomicU32,
    }

    impl MockCatalog {
        fn new(products: Vec<(&str, Product)>) -> Self {
            Self {
                login_ok: true,
                products: products.into_iter().map(|(s, p)| (s.to_string(), p)).collect(),
                login_calls: 0,
                fetch_calls: AtomicU32::new(0),
            }
        }

        fn failing_login() -> Self {
            let mut mock = Self::new(Vec::new());
            mock.login_ok = false;
            mock
        }

        fn fetch_count(&self) -> u32 {
            self.fetch_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Catalog for MockCatalog {
        async fn login(&mut self) -> Result<(), PartnerError> {
            self.login_calls += 1;
            if self.login_ok {
                Ok(())
            } else {
                Err(PartnerError::Status { status: 401, url: "mock://login".to_string() })
            }
        }

        async fn get_product(&self, slug: &str) -> Result<Product, PartnerError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.products.get(slug).cloned().ok_or_else(|| PartnerError::Status {
                status: 404,
                url: format!("mock://products/{slug}"),
            })
        }
    }

    fn make_product(variants: Vec<(&str, i64, i64)>) -> Product {
        Product {
            name: "sample name".to_string(),
            description: "sample description".to_string(),
            variants: variants
                .into_iter()
                .map(|(name, price, stock)| Variant { name: name.to_string(), price, stock })
                .collect(),
        }
    }

    fn make_columns() -> Columns {
        Columns {
            slug: "product_slug".to_string(),
            variant: "variant_name".to_string(),
            price: "price".to_string(),
            stock: "stock_level".to_string(),
            sku: None,
        }
    }

    fn make_rows(csv: &str) -> Vec<Row> {
        let headers: Vec<String> =
            ["product_slug", "variant_name", "price", "stock_level"].map(String::from).to_vec();
        sheet::parse_rows(csv, &headers).unwrap()
    }

    #[tokio::test]
    async fn test_price_and_tier_both_changed() {
        // Old price 1000, old tier 2 (high); remote says 2000 and stock 0
        let rows = make_rows("product_slug,variant_name,price,stock_level\nsample-slug,red,1000,2\n");
        let mut mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 2000, 0)]))]);

        let recon = Reconciler::new(make_columns(), rows);
        let summary = recon.run(&mut mock).await.unwrap();

        assert_eq!(summary.rows_seen, 1);
        assert_eq!(summary.rows_checked, 1);
        assert_eq!(summary.findings, 2);
        assert_eq!(summary.not_found, 0);
        assert_eq!(summary.skipped, 0);
        assert_eq!(mock.login_calls, 1);
    }

    #[tokio::test]
    async fn test_no_changes_no_findings() {
        let rows = make_rows("product_slug,variant_name,price,stock_level\nsample-slug,red,1000,2\n");
        // Price matches, stock 50 derives tier 2 which matches the old tier
        let mut mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 1000, 50)]))]);

        let recon = Reconciler::new(make_columns(), rows);
        let summary = recon.run(&mut mock).await.unwrap();

        assert_eq!(summary.findings, 0);
        assert_eq!(summary.rows_checked, 1);
    }

    #[tokio::test]
    async fn test_currency_formatted_price_cell() {
        let rows =
            make_rows("product_slug,variant_name,price,stock_level\nsample-slug,red,\"Rp1,000\",0\n");
        let mut mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 1000, 0)]))]);

        let recon = Reconciler::new(make_columns(), rows);
        let summary = recon.run(&mut mock).await.unwrap();

        // Rp1,000 == 1000, tier 0 == tier for stock 0
        assert_eq!(summary.findings, 0);
        assert_eq!(summary.rows_checked, 1);
    }

    #[tokio::test]
    async fn test_empty_slug_stops_processing() {
        let rows = make_rows(
            "product_slug,variant_name,price,stock_level\n\
             sample-slug,red,1000,0\n\
             ,red,1000,0\n\
             other-slug,red,1000,0\n",
        );
        let mut mock = MockCatalog::new(vec![
            ("sample-slug", make_product(vec![("red", 1000, 0)])),
            ("other-slug", make_product(vec![("red", 1000, 0)])),
        ]);

        let recon = Reconciler::new(make_columns(), rows);
        let summary = recon.run(&mut mock).await.unwrap();

        // Row before the blank slug is still processed; the one after is not
        assert_eq!(summary.rows_seen, 1);
        assert_eq!(summary.rows_checked, 1);
        assert_eq!(mock.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_variant_not_found() {
        let rows =
            make_rows("product_slug,variant_name,price,stock_level\nsample-slug,green,1000,0\n");
        let mut mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 2000, 0)]))]);

        let recon = Reconciler::new(make_columns(), rows);
        let summary = recon.run(&mut mock).await.unwrap();

        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.findings, 0);
        assert_eq!(summary.rows_checked, 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_continues_to_next_row() {
        let rows = make_rows(
            "product_slug,variant_name,price,stock_level\n\
             unknown-slug,red,1000,0\n\
             sample-slug,red,1000,2\n",
        );
        let mut mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 2000, 0)]))]);

        let recon = Reconciler::new(make_columns(), rows);
        let summary = recon.run(&mut mock).await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.rows_checked, 1);
        assert_eq!(summary.findings, 2);
        assert_eq!(mock.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_bad_price_cell_still_checks_stock() {
        let rows =
            make_rows("product_slug,variant_name,price,stock_level\nsample-slug,red,oops,2\n");
        let mut mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 2000, 0)]))]);

        let recon = Reconciler::new(make_columns(), rows);
        let summary = recon.run(&mut mock).await.unwrap();

        // Price comparison skipped, stock tier 2 vs derived 0 still found
        assert_eq!(summary.rows_checked, 1);
        assert_eq!(summary.findings, 1);
    }

    #[tokio::test]
    async fn test_login_failure_aborts_run() {
        let rows = make_rows("product_slug,variant_name,price,stock_level\nsample-slug,red,1000,0\n");
        let mut mock = MockCatalog::failing_login();

        let recon = Reconciler::new(make_columns(), rows);
        let err = recon.run(&mut mock).await.unwrap_err();

        assert!(err.to_string().contains("login failed"));
        assert_eq!(mock.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_check_row_finding_contents() {
        let rows = make_rows("product_slug,variant_name,price,stock_level\nsample-slug,red,1000,2\n");
        let mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 2000, 0)]))]);

        let recon = Reconciler::new(make_columns(), rows);
        let findings =
            recon.check_row(&mock, &recon.rows[0], "sample-slug").await.unwrap();

        assert_eq!(
            findings,
            vec![
                Finding::PriceChanged {
                    row: 1,
                    key: "sample-slug".to_string(),
                    old: 1000,
                    new: 2000,
                },
                Finding::StockTierChanged {
                    row: 1,
                    key: "sample-slug".to_string(),
                    old: 2,
                    new: 0,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_sku_column_used_as_key_when_configured() {
        let headers: Vec<String> =
            ["sku", "product_slug", "variant_name", "price", "stock_level"].map(String::from).to_vec();
        let rows = sheet::parse_rows(
            "sku,product_slug,variant_name,price,stock_level\nSKU-42,sample-slug,red,1000,2\n",
            &headers,
        )
        .unwrap();
        let mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 2000, 0)]))]);

        let mut columns = make_columns();
        columns.sku = Some("sku".to_string());
        let recon = Reconciler::new(columns, rows);

        let findings = recon.check_row(&mock, &recon.rows[0], "sample-slug").await.unwrap();
        assert!(matches!(&findings[0], Finding::PriceChanged { key, .. } if key == "SKU-42"));
    }

    #[tokio::test]
    async fn test_empty_sku_cell_falls_back_to_slug() {
        let headers: Vec<String> =
            ["sku", "product_slug", "variant_name", "price", "stock_level"].map(String::from).to_vec();
        let rows = sheet::parse_rows(
            "sku,product_slug,variant_name,price,stock_level\n,sample-slug,red,1000,2\n",
            &headers,
        )
        .unwrap();
        let mock = MockCatalog::new(vec![("sample-slug", make_product(vec![("red", 2000, 0)]))]);

        let mut columns = make_columns();
        columns.sku = Some("sku".to_string());
        let recon = Reconciler::new(columns, rows);

        let findings = recon.check_row(&mock, &recon.rows[0], "sample-slug").await.unwrap();
        assert!(matches!(&findings[0], Finding::PriceChanged { key, .. } if key == "sample-slug"));
    }

    #[tokio::test]
    async fn test_duplicate_variant_names_first_wins() {
        let rows = make_rows("product_slug,variant_name,price,stock_level\nsample-slug,red,1000,0\n");
        let mock = MockCatalog::new(vec![(
            "sample-slug",
            make_product(vec![("red", 1000, 0), ("red", 9999, 99)]),
        )]);

        let recon = Reconciler::new(make_columns(), rows);
        let findings = recon.check_row(&mock, &recon.rows[0], "sample-slug").await.unwrap();

        // First "red" matches the old values exactly, so nothing to report
        assert!(findings.is_empty());
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding::PriceChanged {
            row: 3,
            key: "SKU-42".to_string(),
            old: 1000,
            new: 2000,
        };
        assert_eq!(finding.to_string(), "row 3: price changed for SKU-42: 1000 -> 2000");

        let finding = Finding::StockTierChanged {
            row: 3,
            key: "sample-slug".to_string(),
            old: 2,
            new: 0,
        };
        assert_eq!(finding.to_string(), "row 3: stock tier changed for sample-slug: 2 -> 0");
    }
}
