//! SQLite-backed [`Store`] implementation.
//!
//! Aggregation is pushed down to SQL (`SUM`/`GROUP BY`/`JOIN`). Ordering
//! matches the in-process rules in `ecommerce_analytics_core::analytics`:
//! groups tie-break on the load order of their first sale (`MIN(s.id)`) and
//! listings tie-break on product load order (`rowid`).

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use ecommerce_analytics_core::analytics::with_percentages;
use ecommerce_analytics_core::models::{
    CategorySales, Pagination, Product, ProductPage, ProductSummary, Sale, TrendingProduct,
};
use ecommerce_analytics_core::query::{total_pages, ProductQuery, SortField, SortOrder};
use ecommerce_analytics_core::store::Store;
use ecommerce_analytics_core::window::{sale_instant, Window};

use crate::migrate;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Window as whole unix seconds. Sale dates are whole seconds, so the start
/// rounds up and the end rounds down.
fn bounds(window: &Window) -> (i64, i64) {
    let start = window.start.and_utc();
    let round_up = i64::from(start.timestamp_subsec_nanos() > 0);
    (
        start.timestamp() + round_up,
        window.end.and_utc().timestamp(),
    )
}

fn order_column(field: SortField) -> &'static str {
    match field {
        SortField::Id => "p.id",
        SortField::Name => "p.name",
        SortField::Category => "p.category",
        SortField::Price => "p.price",
        SortField::TotalSales => "total_sales",
    }
}

const SEARCH_FILTER: &str = "(?1 IS NULL \
     OR instr(lower(p.name), lower(?1)) > 0 \
     OR instr(lower(p.category), lower(?1)) > 0)";

#[async_trait]
impl Store for SqliteStore {
    async fn replace_products(&self, products: &[Product]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM products").execute(&mut *tx).await?;

        for product in products {
            sqlx::query("INSERT INTO products (id, name, category, price) VALUES (?, ?, ?, ?)")
                .bind(&product.id)
                .bind(&product.name)
                .bind(&product.category)
                .bind(product.price)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn replace_sales(&self, sales: &[Sale]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sales").execute(&mut *tx).await?;

        for sale in sales {
            sqlx::query(
                "INSERT INTO sales (product_id, quantity, sale_date, total_amount) VALUES (?, ?, ?, ?)",
            )
            .bind(&sale.product_id)
            .bind(sale.quantity)
            .bind(sale_instant(sale.sale_date).and_utc().timestamp())
            .bind(sale.total_amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn ensure_indexes(&self) -> Result<()> {
        migrate::create_indexes(&self.pool).await
    }

    async fn total_sales(&self, window: &Window) -> Result<f64> {
        let (start, end) = bounds(window);
        let total: f64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0.0) FROM sales WHERE sale_date >= ? AND sale_date <= ?",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn trending_products(
        &self,
        window: &Window,
        limit: usize,
    ) -> Result<Vec<TrendingProduct>> {
        let (start, end) = bounds(window);
        let rows = sqlx::query(
            r#"
            SELECT p.name AS name, t.quantity_sold, t.total_sales
            FROM (
                SELECT product_id,
                       SUM(quantity) AS quantity_sold,
                       SUM(total_amount) AS total_sales,
                       MIN(id) AS first_seen
                FROM sales
                WHERE sale_date >= ? AND sale_date <= ?
                GROUP BY product_id
                ORDER BY quantity_sold DESC, first_seen ASC
                LIMIT ?
            ) t
            JOIN products p ON p.id = t.product_id
            ORDER BY t.quantity_sold DESC, t.first_seen ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| TrendingProduct {
                name: row.get("name"),
                quantity_sold: row.get("quantity_sold"),
                total_sales: row.get("total_sales"),
            })
            .collect())
    }

    async fn category_sales(&self, window: &Window) -> Result<Vec<CategorySales>> {
        let (start, end) = bounds(window);
        let rows = sqlx::query(
            r#"
            SELECT p.category AS category,
                   SUM(s.total_amount) AS sales,
                   MIN(s.id) AS first_seen
            FROM sales s
            JOIN products p ON p.id = s.product_id
            WHERE s.sale_date >= ? AND s.sale_date <= ?
            GROUP BY p.category
            ORDER BY first_seen ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let sums = rows
            .iter()
            .map(|row| (row.get::<String, _>("category"), row.get::<f64, _>("sales")))
            .collect();

        Ok(with_percentages(sums))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let search = query.search.as_deref();

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM products p WHERE {}",
            SEARCH_FILTER
        ))
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        let direction = match query.sort_order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        let sql = format!(
            r#"
            SELECT p.id, p.name, p.category, p.price,
                   COALESCE(u.units, 0.0) AS total_sales
            FROM products p
            LEFT JOIN (
                SELECT product_id, SUM(quantity) AS units
                FROM sales
                GROUP BY product_id
            ) u ON u.product_id = p.id
            WHERE {}
            ORDER BY {} {}, p.rowid ASC
            LIMIT ?2 OFFSET ?3
            "#,
            SEARCH_FILTER,
            order_column(query.sort_by),
            direction
        );

        let rows = sqlx::query(&sql)
            .bind(search)
            .bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(query.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let products = rows
            .iter()
            .map(|row| ProductSummary {
                id: row.get("id"),
                name: row.get("name"),
                category: row.get("category"),
                price: row.get("price"),
                total_sales: row.get("total_sales"),
            })
            .collect();

        let total = u64::try_from(total).unwrap_or(0);
        Ok(ProductPage {
            products,
            pagination: Pagination {
                total,
                page: query.page,
                limit: query.limit,
                total_pages: total_pages(total, query.limit),
            },
        })
    }
}
