//! Storage abstraction for ecommerce-analytics.
//!
//! The [`Store`] trait covers everything the loader writes and everything
//! the query layer reads, so backends can either push aggregation down to
//! their engine (SQLite) or compute it in process ([`memory::InMemoryStore`]).
//!
//! Implementations must be `Send + Sync` to be shared across request
//! handlers.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CategorySales, Product, ProductPage, Sale, TrendingProduct};
use crate::query::ProductQuery;
use crate::window::Window;

/// Abstract storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`replace_products`](Store::replace_products) | Discard all products, insert a new generation |
/// | [`replace_sales`](Store::replace_sales) | Discard all sales, insert a new generation |
/// | [`ensure_indexes`](Store::ensure_indexes) | Create lookup indexes (no-op where irrelevant) |
/// | [`total_sales`](Store::total_sales) | Revenue inside a window |
/// | [`trending_products`](Store::trending_products) | Top products by units inside a window |
/// | [`category_sales`](Store::category_sales) | Revenue share per category inside a window |
/// | [`list_products`](Store::list_products) | Searchable, sorted, paginated product listing |
#[async_trait]
pub trait Store: Send + Sync {
    /// Full-replace the product set. An empty slice leaves the set empty.
    async fn replace_products(&self, products: &[Product]) -> Result<()>;

    /// Full-replace the sale set. Insertion order is the tie-break order
    /// for later aggregation.
    async fn replace_sales(&self, sales: &[Sale]) -> Result<()>;

    async fn ensure_indexes(&self) -> Result<()>;

    /// Sum of sale amounts inside `window`; `0.0` when nothing matches.
    async fn total_sales(&self, window: &Window) -> Result<f64>;

    async fn trending_products(&self, window: &Window, limit: usize)
        -> Result<Vec<TrendingProduct>>;

    async fn category_sales(&self, window: &Window) -> Result<Vec<CategorySales>>;

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage>;
}
