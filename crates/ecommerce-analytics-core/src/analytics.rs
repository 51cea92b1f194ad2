//! In-process sales aggregation.
//!
//! These functions compute every analytics response directly over slices
//! of [`Product`] and [`Sale`] records. They define the ordering rules that
//! the SQL backend reproduces:
//!
//! - groups keep the order in which their first sale appears;
//! - sorts are stable, so ties keep that order;
//! - a sale whose product is missing is dropped from joined results.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{
    CategorySales, Pagination, Product, ProductPage, ProductSummary, Sale, TrendingProduct,
};
use crate::query::{matches_search, total_pages, ProductQuery, SortField, SortOrder};
use crate::window::Window;

/// Sum of `total_amount` over sales inside `window`.
pub fn total_sales(sales: &[Sale], window: &Window) -> f64 {
    sales
        .iter()
        .filter(|s| window.contains(s.sale_date))
        .map(|s| s.total_amount)
        .sum()
}

/// Top `limit` products by units sold inside `window`.
///
/// The limit is applied before the product join, so a top group whose
/// product is missing leaves the result shorter than `limit`.
pub fn trending_products(
    products: &[Product],
    sales: &[Sale],
    window: &Window,
    limit: usize,
) -> Vec<TrendingProduct> {
    let mut groups: Vec<(&str, f64, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sale in sales.iter().filter(|s| window.contains(s.sale_date)) {
        let slot = *index.entry(sale.product_id.as_str()).or_insert_with(|| {
            groups.push((sale.product_id.as_str(), 0.0, 0.0));
            groups.len() - 1
        });
        groups[slot].1 += sale.quantity;
        groups[slot].2 += sale.total_amount;
    }

    groups.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    groups.truncate(limit);

    let by_id = product_index(products);
    groups
        .into_iter()
        .filter_map(|(product_id, quantity_sold, total_sales)| {
            by_id.get(product_id).map(|p| TrendingProduct {
                name: p.name.clone(),
                quantity_sold,
                total_sales,
            })
        })
        .collect()
}

/// Sales per product category inside `window`, with each category's share
/// of the joined grand total.
pub fn category_sales(products: &[Product], sales: &[Sale], window: &Window) -> Vec<CategorySales> {
    let by_id = product_index(products);
    let mut sums: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sale in sales.iter().filter(|s| window.contains(s.sale_date)) {
        let Some(product) = by_id.get(sale.product_id.as_str()) else {
            continue;
        };
        let slot = *index.entry(product.category.as_str()).or_insert_with(|| {
            sums.push((product.category.clone(), 0.0));
            sums.len() - 1
        });
        sums[slot].1 += sale.total_amount;
    }

    with_percentages(sums)
}

/// Attach percentages to per-category sums. When the grand total is zero
/// every percentage is zero.
pub fn with_percentages(sums: Vec<(String, f64)>) -> Vec<CategorySales> {
    let grand_total: f64 = sums.iter().map(|(_, s)| s).sum();
    sums.into_iter()
        .map(|(category, sales)| CategorySales {
            percentage: if grand_total > 0.0 {
                sales / grand_total * 100.0
            } else {
                0.0
            },
            category,
            sales,
        })
        .collect()
}

/// One page of products matching `query`, each annotated with lifetime
/// units sold across all sales.
pub fn list_products(products: &[Product], sales: &[Sale], query: &ProductQuery) -> ProductPage {
    let mut units: HashMap<&str, f64> = HashMap::new();
    for sale in sales {
        *units.entry(sale.product_id.as_str()).or_insert(0.0) += sale.quantity;
    }

    let mut matching: Vec<ProductSummary> = products
        .iter()
        .filter(|p| match query.search.as_deref() {
            Some(term) => matches_search(&p.name, term) || matches_search(&p.category, term),
            None => true,
        })
        .map(|p| ProductSummary {
            id: p.id.clone(),
            name: p.name.clone(),
            category: p.category.clone(),
            price: p.price,
            total_sales: units.get(p.id.as_str()).copied().unwrap_or(0.0),
        })
        .collect();

    matching.sort_by(|a, b| {
        let ord = compare_by(a, b, query.sort_by);
        match query.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let total = matching.len() as u64;
    let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
    let page: Vec<ProductSummary> = matching.into_iter().skip(offset).take(limit).collect();

    ProductPage {
        products: page,
        pagination: Pagination {
            total,
            page: query.page,
            limit: query.limit,
            total_pages: total_pages(total, query.limit),
        },
    }
}

fn compare_by(a: &ProductSummary, b: &ProductSummary, field: SortField) -> Ordering {
    match field {
        SortField::Id => a.id.cmp(&b.id),
        SortField::Name => a.name.cmp(&b.name),
        SortField::Category => a.category.cmp(&b.category),
        SortField::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
        SortField::TotalSales => a
            .total_sales
            .partial_cmp(&b.total_sales)
            .unwrap_or(Ordering::Equal),
    }
}

fn product_index(products: &[Product]) -> HashMap<&str, &Product> {
    products.iter().map(|p| (p.id.as_str(), p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::Period;
    use chrono::NaiveDate;

    fn product(id: &str, name: &str, category: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            price,
        }
    }

    fn sale(id: &str, qty: f64, day: u32, amount: f64) -> Sale {
        Sale {
            product_id: id.to_string(),
            quantity: qty,
            sale_date: NaiveDate::from_ymd_opt(2023, 12, day).unwrap(),
            total_amount: amount,
        }
    }

    fn december() -> Window {
        let now = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Window::for_period(Period::Month, now)
    }

    fn fixture() -> (Vec<Product>, Vec<Sale>) {
        (
            vec![product("A", "Alpha", "Toys", 10.0), product("B", "Beta", "Books", 20.0)],
            vec![sale("A", 2.0, 29, 20.0), sale("B", 1.0, 30, 20.0)],
        )
    }

    #[test]
    fn test_total_sales() {
        let (_, sales) = fixture();
        assert_eq!(total_sales(&sales, &december()), 40.0);
        assert_eq!(total_sales(&[], &december()), 0.0);
    }

    #[test]
    fn test_total_sales_window_boundaries() {
        let sales = vec![sale("A", 1.0, 1, 5.0), sale("A", 1.0, 31, 7.0)];
        let november = Sale {
            sale_date: NaiveDate::from_ymd_opt(2023, 11, 30).unwrap(),
            ..sale("A", 1.0, 1, 100.0)
        };
        let mut all = sales.clone();
        all.push(november);
        assert_eq!(total_sales(&all, &december()), 12.0);
    }

    #[test]
    fn test_trending_scenario() {
        let (products, sales) = fixture();
        let trending = trending_products(&products, &sales, &december(), 5);
        assert_eq!(
            trending,
            vec![
                TrendingProduct {
                    name: "Alpha".into(),
                    quantity_sold: 2.0,
                    total_sales: 20.0
                },
                TrendingProduct {
                    name: "Beta".into(),
                    quantity_sold: 1.0,
                    total_sales: 20.0
                },
            ]
        );
    }

    #[test]
    fn test_trending_ties_keep_first_appearance() {
        let products = vec![product("A", "Alpha", "Toys", 1.0), product("B", "Beta", "Toys", 1.0)];
        let sales = vec![sale("B", 1.0, 10, 1.0), sale("A", 1.0, 11, 1.0)];
        let names: Vec<String> = trending_products(&products, &sales, &december(), 5)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Beta", "Alpha"]);
    }

    #[test]
    fn test_trending_limit_applies_before_join() {
        let products = vec![product("A", "Alpha", "Toys", 1.0)];
        let sales = vec![sale("GHOST", 9.0, 10, 9.0), sale("A", 1.0, 10, 1.0)];
        assert!(trending_products(&products, &sales, &december(), 1).is_empty());
        assert_eq!(trending_products(&products, &sales, &december(), 2).len(), 1);
    }

    #[test]
    fn test_trending_top_five() {
        let products: Vec<Product> = (0..7)
            .map(|i| product(&format!("P{i}"), &format!("N{i}"), "C", 1.0))
            .collect();
        let sales: Vec<Sale> = (0..7)
            .map(|i| sale(&format!("P{i}"), f64::from(i + 1), 10, 1.0))
            .collect();
        let trending = trending_products(&products, &sales, &december(), 5);
        assert_eq!(trending.len(), 5);
        assert_eq!(trending[0].name, "N6");
        assert_eq!(trending[4].name, "N2");
    }

    #[test]
    fn test_category_scenario() {
        let (products, sales) = fixture();
        let categories = category_sales(&products, &sales, &december());
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category, "Toys");
        assert_eq!(categories[0].sales, 20.0);
        assert!((categories[0].percentage - 50.0).abs() < 1e-9);
        assert_eq!(categories[1].category, "Books");
        assert!((categories[1].percentage - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_category_percentages_sum_to_hundred() {
        let products = vec![
            product("A", "a", "X", 1.0),
            product("B", "b", "Y", 1.0),
            product("C", "c", "Z", 1.0),
        ];
        let sales = vec![
            sale("A", 1.0, 3, 13.37),
            sale("B", 1.0, 4, 0.01),
            sale("C", 1.0, 5, 999.5),
            sale("A", 1.0, 6, 42.0),
            sale("MISSING", 1.0, 6, 500.0),
        ];
        let categories = category_sales(&products, &sales, &december());
        let sum: f64 = categories.iter().map(|c| c.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        let total: f64 = categories.iter().map(|c| c.sales).sum();
        assert!((total - 1054.88).abs() < 1e-9);
    }

    #[test]
    fn test_category_zero_total() {
        let result = with_percentages(vec![("X".into(), 0.0)]);
        assert_eq!(result[0].percentage, 0.0);
        assert!(category_sales(&[], &[], &december()).is_empty());
    }

    #[test]
    fn test_listing_pagination() {
        let (products, sales) = fixture();
        let query = ProductQuery {
            page: 2,
            limit: 1,
            ..ProductQuery::default()
        };
        let page = list_products(&products, &sales, &query);
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.products[0].name, "Beta");
        assert_eq!(page.pagination.total, 2);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[test]
    fn test_listing_lifetime_units_ignore_window() {
        let products = vec![product("A", "Alpha", "Toys", 1.0)];
        let mut sales = vec![sale("A", 2.0, 1, 2.0)];
        sales.push(Sale {
            sale_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            ..sale("A", 3.0, 1, 3.0)
        });
        let page = list_products(&products, &sales, &ProductQuery::default());
        assert_eq!(page.products[0].total_sales, 5.0);
    }

    #[test]
    fn test_listing_search_category() {
        let products = vec![
            product("A", "Alpha", "Toys", 1.0),
            product("B", "Beta", "Books", 1.0),
            product("C", "Gamma", "toys", 1.0),
        ];
        let query = ProductQuery {
            search: Some("TOY".into()),
            ..ProductQuery::default()
        };
        let page = list_products(&products, &[], &query);
        let ids: Vec<&str> = page.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[test]
    fn test_listing_sort_desc_stable() {
        let products = vec![
            product("A", "Alpha", "Toys", 5.0),
            product("B", "Beta", "Books", 9.0),
            product("C", "Gamma", "Toys", 5.0),
        ];
        let query = ProductQuery {
            sort_by: SortField::Price,
            sort_order: SortOrder::Desc,
            ..ProductQuery::default()
        };
        let page = list_products(&products, &[], &query);
        let ids: Vec<&str> = page.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_listing_page_past_end() {
        let (products, sales) = fixture();
        let query = ProductQuery {
            page: 9,
            ..ProductQuery::default()
        };
        let page = list_products(&products, &sales, &query);
        assert!(page.products.is_empty());
        assert_eq!(page.pagination.total_pages, 1);
    }
}
