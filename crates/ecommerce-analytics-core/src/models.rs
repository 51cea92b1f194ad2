//! Core data models used throughout ecommerce-analytics.
//!
//! [`Product`] and [`Sale`] are the two persisted record types produced by
//! the loader. The remaining types are the JSON response shapes returned by
//! the HTTP endpoints and the `ecx report` commands.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel substituted for blank or missing string fields during cleaning.
pub const UNKNOWN: &str = "Unknown";

/// A catalogue product, keyed by the identifier supplied in the source data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
}

/// A flat sale fact. `product_id` is a logical reference to [`Product::id`]
/// and is never checked at write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub product_id: String,
    pub quantity: f64,
    pub sale_date: NaiveDate,
    pub total_amount: f64,
}

/// Response body of `GET /analytics/total_sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalSales {
    pub total_sales: f64,
}

/// One entry of `GET /analytics/trending_products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingProduct {
    pub name: String,
    pub quantity_sold: f64,
    pub total_sales: f64,
}

/// One entry of `GET /analytics/category_sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySales {
    pub category: String,
    pub sales: f64,
    pub percentage: f64,
}

/// A product annotated with its lifetime units sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Response body of `GET /products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<ProductSummary>,
    pub pagination: Pagination,
}
