//! Batch loader: CSV files → validation → full-replace into the store.
//!
//! Runs once per invocation of `ecx load`. Both input files are checked and
//! parsed before the store is touched, so a missing or malformed file
//! leaves existing data alone. Once writing starts, products and sales are
//! replaced one after the other, each in its own transaction; a failure
//! while writing sales leaves the new products in place.
//!
//! The loader must not run concurrently with itself. Readers may observe a
//! half-replaced dataset while a load is in progress.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use ecommerce_analytics_core::clean::{
    validate_products, validate_sales, ProductBatch, ProductRow, SaleBatch, SaleRow,
};
use ecommerce_analytics_core::models::Sale;
use ecommerce_analytics_core::store::Store;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// How many admitted sales are echoed in the summary.
const SAMPLE_SALES: usize = 5;

/// Counts and ranges reported after a load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub products_loaded: usize,
    pub products_skipped: usize,
    pub sales_loaded: usize,
    pub sales_skipped: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Admitted sales whose product id matched no admitted product.
    pub orphan_sales: usize,
}

/// CLI entry point for `ecx load`.
///
/// `products` and `sales` override the paths from `[loader]`.
pub async fn run_load(
    config: &Config,
    products: Option<PathBuf>,
    sales: Option<PathBuf>,
) -> Result<LoadReport> {
    let products_path = products.unwrap_or_else(|| config.loader.products_csv.clone());
    let sales_path = sales.unwrap_or_else(|| config.loader.sales_csv.clone());

    info!(products = %products_path.display(), sales = %sales_path.display(), "checking input files");
    if !products_path.exists() {
        bail!("Products CSV file not found: {}", products_path.display());
    }
    if !sales_path.exists() {
        bail!("Sales CSV file not found: {}", sales_path.display());
    }

    let product_batch = validate_products(read_rows::<ProductRow>(&products_path)?);
    let sale_batch = validate_sales(
        read_rows::<SaleRow>(&sales_path)?,
        config.loader.rejected_sample_limit,
    );

    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;
    let store = SqliteStore::new(pool);

    let report = load_batches(&store, &product_batch, &sale_batch).await?;
    print_report(&report, &sale_batch.sales);

    store.pool().close().await;
    Ok(report)
}

/// Parse every data row of a headed CSV file.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV '{}'", path.display()))?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<T>().enumerate() {
        // Header is line 1.
        let row = record.with_context(|| {
            format!("Failed to read CSV '{}' at line {}", path.display(), i + 2)
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Write validated batches into `store`: replace products, replace sales,
/// then make sure the lookup indexes exist.
pub async fn load_batches(
    store: &dyn Store,
    products: &ProductBatch,
    sales: &SaleBatch,
) -> Result<LoadReport> {
    if products.duplicates > 0 {
        warn!(count = products.duplicates, "skipped products with a repeated ProductID");
    }

    for rejected in &sales.rejected_samples {
        warn!(
            date = ?rejected.date,
            is_valid_date = rejected.is_valid_date(),
            quantity = rejected.quantity,
            total_amount = rejected.total_amount,
            product_id = ?rejected.product_id,
            original = ?rejected.raw,
            "skipped invalid sale"
        );
    }

    store
        .replace_products(&products.products)
        .await
        .context("Failed to replace products")?;
    info!(count = products.products.len(), "products replaced");

    store
        .replace_sales(&sales.sales)
        .await
        .context("Failed to replace sales")?;
    info!(count = sales.sales.len(), "sales replaced");

    store.ensure_indexes().await?;

    let known: HashSet<&str> = products.products.iter().map(|p| p.id.as_str()).collect();
    let orphan_sales = sales
        .sales
        .iter()
        .filter(|s| !known.contains(s.product_id.as_str()))
        .count();
    if orphan_sales > 0 {
        warn!(
            count = orphan_sales,
            "sales reference unknown products and will be left out of joined analytics"
        );
    }

    Ok(LoadReport {
        products_loaded: products.products.len(),
        products_skipped: products.skipped,
        sales_loaded: sales.sales.len(),
        sales_skipped: sales.skipped,
        date_range: sales.date_range,
        orphan_sales,
    })
}

fn print_report(report: &LoadReport, sales: &[Sale]) {
    println!("load products");
    println!("  loaded: {} valid products", report.products_loaded);
    println!("  skipped: {} invalid products", report.products_skipped);
    println!("load sales");
    println!("  loaded: {} valid sales", report.sales_loaded);
    println!("  skipped: {} invalid sales", report.sales_skipped);
    match report.date_range {
        Some((min, max)) => println!("  date range: {} to {}", min, max),
        None => println!("  date range: (no sales)"),
    }
    if report.orphan_sales > 0 {
        println!("  unknown product references: {}", report.orphan_sales);
    }
    if !sales.is_empty() {
        println!("  sample sales:");
        for (i, sale) in sales.iter().take(SAMPLE_SALES).enumerate() {
            println!(
                "    Sale {}: ProductID={}, Quantity={}, Date={}, Amount={}",
                i + 1,
                sale.product_id,
                sale.quantity,
                sale.sale_date,
                sale.total_amount
            );
        }
    }
    println!("ok");
}
