//! In-memory [`Store`] implementation for testing and embedding.
//!
//! Records live in `Vec`s behind `std::sync::RwLock`. Every query is
//! answered by the functions in [`crate::analytics`].

use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::analytics;
use crate::models::{CategorySales, Product, ProductPage, Sale, TrendingProduct};
use crate::query::ProductQuery;
use crate::window::Window;

use super::Store;

/// In-memory store.
#[derive(Default)]
pub struct InMemoryStore {
    products: RwLock<Vec<Product>>,
    sales: RwLock<Vec<Sale>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store already holding `products` and `sales`.
    pub fn with_records(products: Vec<Product>, sales: Vec<Sale>) -> Self {
        Self {
            products: RwLock::new(products),
            sales: RwLock::new(sales),
        }
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl Store for InMemoryStore {
    async fn replace_products(&self, products: &[Product]) -> Result<()> {
        let mut stored = self.products.write().map_err(poisoned)?;
        *stored = products.to_vec();
        Ok(())
    }

    async fn replace_sales(&self, sales: &[Sale]) -> Result<()> {
        let mut stored = self.sales.write().map_err(poisoned)?;
        *stored = sales.to_vec();
        Ok(())
    }

    async fn ensure_indexes(&self) -> Result<()> {
        Ok(())
    }

    async fn total_sales(&self, window: &Window) -> Result<f64> {
        let sales = self.sales.read().map_err(poisoned)?;
        Ok(analytics::total_sales(&sales, window))
    }

    async fn trending_products(
        &self,
        window: &Window,
        limit: usize,
    ) -> Result<Vec<TrendingProduct>> {
        let products = self.products.read().map_err(poisoned)?;
        let sales = self.sales.read().map_err(poisoned)?;
        Ok(analytics::trending_products(&products, &sales, window, limit))
    }

    async fn category_sales(&self, window: &Window) -> Result<Vec<CategorySales>> {
        let products = self.products.read().map_err(poisoned)?;
        let sales = self.sales.read().map_err(poisoned)?;
        Ok(analytics::category_sales(&products, &sales, window))
    }

    async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage> {
        let products = self.products.read().map_err(poisoned)?;
        let sales = self.sales.read().map_err(poisoned)?;
        Ok(analytics::list_products(&products, &sales, query))
    }
}
