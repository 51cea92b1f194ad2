//! Typed request parameters.
//!
//! Query strings arrive as decoded key/value pairs, are collected into
//! optional strings ([`PeriodParams`], [`ProductListParams`]), and are parsed
//! into typed values here. Parsing never fails: each malformed value falls
//! back to its own default and a repeated key keeps its first value.

use crate::window::Period;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Raw `?period=` parameter shared by the analytics endpoints.
#[derive(Debug, Clone, Default)]
pub struct PeriodParams {
    pub period: Option<String>,
}

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

impl PeriodParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            period: first_value(pairs, "period"),
        }
    }

    pub fn period(&self) -> Period {
        Period::parse(self.period.as_deref())
    }
}

/// Raw query string of `GET /products`.
#[derive(Debug, Clone, Default)]
pub struct ProductListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub search: Option<String>,
}

impl ProductListParams {
    /// Collect `page`, `limit`, `sortBy`, `sortOrder` and `search`.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            page: first_value(pairs, "page"),
            limit: first_value(pairs, "limit"),
            sort_by: first_value(pairs, "sortBy"),
            sort_order: first_value(pairs, "sortOrder"),
            search: first_value(pairs, "search"),
        }
    }
}

/// Product field a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    Id,
    #[default]
    Name,
    Category,
    Price,
    /// Lifetime units sold.
    TotalSales,
}

impl SortField {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("id") | Some("_id") => SortField::Id,
            Some("name") => SortField::Name,
            Some("category") => SortField::Category,
            Some("price") => SortField::Price,
            Some("totalSales") => SortField::TotalSales,
            _ => SortField::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// Parsed listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: u64,
    pub limit: u64,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    /// Case-insensitive substring matched against name or category.
    pub search: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            search: None,
        }
    }
}

impl ProductQuery {
    /// Parse raw parameters, using `default_limit` when `limit` is missing
    /// or not a positive integer.
    pub fn from_params(params: &ProductListParams, default_limit: u64) -> Self {
        Self {
            page: positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE),
            limit: positive(params.limit.as_deref()).unwrap_or(default_limit),
            sort_by: SortField::parse(params.sort_by.as_deref()),
            sort_order: SortOrder::parse(params.sort_order.as_deref()),
            search: params.search.clone().filter(|s| !s.is_empty()),
        }
    }

    /// Number of matching rows skipped before this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn positive(value: Option<&str>) -> Option<u64> {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
}

/// `ceil(total / limit)`; zero matches means zero pages.
pub fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        0
    } else {
        total.div_ceil(limit)
    }
}

/// Whether `haystack` contains `needle`, ignoring ASCII case.
pub fn matches_search(haystack: &str, needle: &str) -> bool {
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}
