//! CLI mirrors of the HTTP endpoints.
//!
//! `ecx report <kind>` and `ecx products` run the same store queries as the
//! server and print the same JSON bodies to stdout, which makes the
//! analytics easy to script and diff.

use anyhow::Result;
use serde::Serialize;

use ecommerce_analytics_core::models::TotalSales;
use ecommerce_analytics_core::query::{ProductListParams, ProductQuery};
use ecommerce_analytics_core::store::Store;
use ecommerce_analytics_core::window::Period;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Which analytics endpoint to reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    TotalSales,
    Trending,
    Categories,
}

/// Compute one analytics report as a JSON value.
pub async fn build_report(
    store: &dyn Store,
    config: &Config,
    kind: ReportKind,
    period: Option<&str>,
) -> Result<serde_json::Value> {
    let window = config.analytics.clock()?.window(Period::parse(period));

    let value = match kind {
        ReportKind::TotalSales => to_json(&TotalSales {
            total_sales: store.total_sales(&window).await?,
        })?,
        ReportKind::Trending => to_json(
            &store
                .trending_products(&window, config.analytics.trending_limit)
                .await?,
        )?,
        ReportKind::Categories => to_json(&store.category_sales(&window).await?)?,
    };

    Ok(value)
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

async fn open_store(config: &Config) -> Result<SqliteStore> {
    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;
    Ok(SqliteStore::new(pool))
}

/// CLI entry point for `ecx report`.
pub async fn run_report(config: &Config, kind: ReportKind, period: Option<String>) -> Result<()> {
    let store = open_store(config).await?;
    let value = build_report(&store, config, kind, period.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    store.pool().close().await;
    Ok(())
}

/// CLI entry point for `ecx products`.
pub async fn run_products(config: &Config, params: ProductListParams) -> Result<()> {
    let store = open_store(config).await?;
    let query = ProductQuery::from_params(&params, config.listing.default_limit);
    let page = store.list_products(&query).await?;
    println!("{}", serde_json::to_string_pretty(&page)?);
    store.pool().close().await;
    Ok(())
}
