//! Database statistics.
//!
//! Summarizes what the last load left behind: product, sale, and category
//! counts plus the stored sale date range. Used by `ecx stats` to check a
//! load before pointing the dashboard at it.

use anyhow::Result;
use chrono::{DateTime, NaiveDate};
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::migrate;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::create_schema(&pool).await?;

    let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await?;

    let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(&pool)
        .await?;

    let range = sqlx::query("SELECT MIN(sale_date) AS first, MAX(sale_date) AS last FROM sales")
        .fetch_one(&pool)
        .await?;
    let first: Option<i64> = range.get("first");
    let last: Option<i64> = range.get("last");

    let revenue: f64 = sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0.0) FROM sales")
        .fetch_one(&pool)
        .await?;

    let orphans: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sales s LEFT JOIN products p ON p.id = s.product_id WHERE p.id IS NULL",
    )
    .fetch_one(&pool)
    .await?;

    let category_rows = sqlx::query(
        r#"
        SELECT category, COUNT(*) AS product_count
        FROM products
        GROUP BY category
        ORDER BY product_count DESC, category ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Ecommerce Analytics: Database Stats");
    println!("==================================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Products:    {}", products);
    println!("  Sales:       {}", sales);
    println!("  Revenue:     {:.2}", revenue);
    match (first.and_then(ts_to_date), last.and_then(ts_to_date)) {
        (Some(first), Some(last)) => println!("  Date range:  {} to {}", first, last),
        _ => println!("  Date range:  (no sales)"),
    }
    if orphans > 0 {
        println!("  Unmatched:   {} sales reference unknown products", orphans);
    }

    if !category_rows.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<32} {:>8}", "CATEGORY", "PRODUCTS");
        println!("  {}", "-".repeat(41));
        for row in &category_rows {
            let category: String = row.get("category");
            let count: i64 = row.get("product_count");
            println!("  {:<32} {:>8}", category, count);
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

fn ts_to_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
