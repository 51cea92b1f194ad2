use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    create_schema(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the `products` and `sales` tables and their indexes. Idempotent.
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            price REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // `id` is load order only; sales have no natural key.
    // `sale_date` is unix seconds at 00:00 UTC of the sale's calendar date.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sales (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_id TEXT NOT NULL,
            quantity REAL NOT NULL,
            sale_date INTEGER NOT NULL,
            total_amount REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await
}

/// Lookup indexes backing the analytics queries. None of them are unique.
pub async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sales_sale_date ON sales(sale_date)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sales_product_id ON sales(product_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_category ON products(category)")
        .execute(pool)
        .await?;
    Ok(())
}
