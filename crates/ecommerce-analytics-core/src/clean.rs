//! CSV row cleaning and admission rules.
//!
//! Raw rows are deserialized with every column optional, so a missing
//! column and an empty cell look the same. Numeric fields never reject a
//! row on their own: an unparseable number coerces to zero and the
//! positivity checks that follow decide admission. Dates are the exception:
//! a date that cannot be parsed rejects the row.

use std::collections::HashSet;

use chrono::{Duration, Months, NaiveDate};
use serde::Deserialize;

use crate::models::{Product, Sale, UNKNOWN};

/// One row of the products CSV (`ProductID, ProductName, Category, Price`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductRow {
    #[serde(rename = "ProductID", default)]
    pub product_id: Option<String>,
    #[serde(rename = "ProductName", default)]
    pub product_name: Option<String>,
    #[serde(rename = "Category", default)]
    pub category: Option<String>,
    #[serde(rename = "Price", default)]
    pub price: Option<String>,
}

/// One row of the sales CSV (`Date, ProductID, Quantity, TotalAmount`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleRow {
    #[serde(rename = "Date", default)]
    pub date: Option<String>,
    #[serde(rename = "ProductID", default)]
    pub product_id: Option<String>,
    #[serde(rename = "Quantity", default)]
    pub quantity: Option<String>,
    #[serde(rename = "TotalAmount", default)]
    pub total_amount: Option<String>,
}

/// Parse a numeric cell. Anything that is not a finite number becomes `0.0`.
pub fn parse_number(value: Option<&str>) -> f64 {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Trim a string cell, substituting [`UNKNOWN`] when nothing is left.
pub fn clean_string(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// Parse a `YYYY-MM-DD` cell into a calendar date.
///
/// The cell is split on `-` and the leading integer of each of the first
/// three parts is taken, so `2023-1-5` and `2023-12-01T10:00` both parse
/// and any parts after the day are ignored. Month and day overflow roll
/// forward: `2023-02-30` is 2 March and `2023-13-01` is 1 January 2024.
/// A missing part, or one without leading digits, is invalid.
pub fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let mut parts = value?.split('-');
    let year = leading_int(parts.next()?)?;
    let month = leading_int(parts.next()?)?;
    let day = leading_int(parts.next()?)?;

    let first_of_year = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, 1, 1)?;
    // Month 0 is December of the previous year, day 0 the last day of the
    // previous month.
    let shifted = match month {
        0 => first_of_year.checked_sub_months(Months::new(1))?,
        m => first_of_year.checked_add_months(Months::new(u32::try_from(m - 1).ok()?))?,
    };
    shifted.checked_add_signed(Duration::try_days(i64::try_from(day).ok()? - 1)?)
}

/// Integer prefix of `part` after leading whitespace and an optional `+`.
/// Parts never start with `-` since the cell is split on it.
fn leading_int(part: &str) -> Option<u64> {
    let part = part.trim_start();
    let rest = part.strip_prefix('+').unwrap_or(part);
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Validated products plus the rejection count.
#[derive(Debug, Clone, Default)]
pub struct ProductBatch {
    pub products: Vec<Product>,
    pub skipped: usize,
    pub duplicates: usize,
}

/// Admit a product row: price must parse above zero and the raw id, name,
/// and category cells must all be non-empty.
pub fn validate_product(row: &ProductRow) -> Option<Product> {
    let price = parse_number(row.price.as_deref());
    if price > 0.0 && present(&row.product_id) && present(&row.product_name) && present(&row.category)
    {
        Some(Product {
            id: clean_string(row.product_id.as_deref()),
            name: clean_string(row.product_name.as_deref()),
            category: clean_string(row.category.as_deref()),
            price,
        })
    } else {
        None
    }
}

/// Validate every product row. A repeated product id keeps the first row
/// and counts later ones as skipped.
pub fn validate_products<I>(rows: I) -> ProductBatch
where
    I: IntoIterator<Item = ProductRow>,
{
    let mut batch = ProductBatch::default();
    let mut seen = HashSet::new();

    for row in rows {
        match validate_product(&row) {
            Some(product) if seen.insert(product.id.clone()) => batch.products.push(product),
            Some(_) => {
                batch.duplicates += 1;
                batch.skipped += 1;
            }
            None => batch.skipped += 1,
        }
    }

    batch
}

/// A rejected sale with the values parsed at the time of rejection.
#[derive(Debug, Clone)]
pub struct RejectedSale {
    pub date: Option<NaiveDate>,
    pub quantity: f64,
    pub total_amount: f64,
    pub product_id: Option<String>,
    pub raw: SaleRow,
}

impl RejectedSale {
    pub fn is_valid_date(&self) -> bool {
        self.date.is_some()
    }
}

/// Validated sales, rejection statistics, and the observed date range.
#[derive(Debug, Clone, Default)]
pub struct SaleBatch {
    pub sales: Vec<Sale>,
    pub skipped: usize,
    pub rejected_samples: Vec<RejectedSale>,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Admit a sale row, or describe why it was rejected.
pub fn validate_sale(row: SaleRow) -> Result<Sale, RejectedSale> {
    let date = parse_date(row.date.as_deref());
    let quantity = parse_number(row.quantity.as_deref());
    let total_amount = parse_number(row.total_amount.as_deref());

    match date {
        Some(sale_date) if quantity > 0.0 && total_amount > 0.0 && present(&row.product_id) => {
            Ok(Sale {
                product_id: clean_string(row.product_id.as_deref()),
                quantity,
                sale_date,
                total_amount,
            })
        }
        _ => Err(RejectedSale {
            date,
            quantity,
            total_amount,
            product_id: row.product_id.clone(),
            raw: row,
        }),
    }
}

/// Validate every sale row, keeping up to `sample_limit` rejected rows for
/// diagnostics and tracking the min/max date of admitted sales.
pub fn validate_sales<I>(rows: I, sample_limit: usize) -> SaleBatch
where
    I: IntoIterator<Item = SaleRow>,
{
    let mut batch = SaleBatch::default();

    for row in rows {
        match validate_sale(row) {
            Ok(sale) => {
                let d = sale.sale_date;
                batch.date_range = Some(match batch.date_range {
                    Some((min, max)) => (min.min(d), max.max(d)),
                    None => (d, d),
                });
                batch.sales.push(sale);
            }
            Err(rejected) => {
                batch.skipped += 1;
                if batch.rejected_samples.len() < sample_limit {
                    batch.rejected_samples.push(rejected);
                }
            }
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_row(id: &str, name: &str, category: &str, price: &str) -> ProductRow {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ProductRow {
            product_id: opt(id),
            product_name: opt(name),
            category: opt(category),
            price: opt(price),
        }
    }

    fn sale_row(date: &str, id: &str, qty: &str, amount: &str) -> SaleRow {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        SaleRow {
            date: opt(date),
            product_id: opt(id),
            quantity: opt(qty),
            total_amount: opt(amount),
        }
    }

    #[test]
    fn test_parse_number_coerces_garbage_to_zero() {
        assert_eq!(parse_number(Some("12.5")), 12.5);
        assert_eq!(parse_number(Some("  7 ")), 7.0);
        assert_eq!(parse_number(Some("abc")), 0.0);
        assert_eq!(parse_number(Some("")), 0.0);
        assert_eq!(parse_number(Some("NaN")), 0.0);
        assert_eq!(parse_number(Some("inf")), 0.0);
        assert_eq!(parse_number(None), 0.0);
    }

    #[test]
    fn test_clean_string() {
        assert_eq!(clean_string(Some("  Toys ")), "Toys");
        assert_eq!(clean_string(Some("")), UNKNOWN);
        assert_eq!(clean_string(Some("   ")), UNKNOWN);
        assert_eq!(clean_string(None), UNKNOWN);
    }

    #[test]
    fn test_clean_string_idempotent() {
        for input in ["Toys", "  Board Games  ", "", "Unknown", "\tA\n"] {
            let once = clean_string(Some(input));
            assert_eq!(clean_string(Some(&once)), once);
        }
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2023-12-01")),
            NaiveDate::from_ymd_opt(2023, 12, 1)
        );
        assert_eq!(parse_date(Some("2023-1-5")), NaiveDate::from_ymd_opt(2023, 1, 5));
        assert_eq!(parse_date(Some("2024-02-29")), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date(Some("2023/12/01")), None);
        assert_eq!(parse_date(Some("2023-12")), None);
        assert_eq!(parse_date(Some("2023-ab-01")), None);
        assert_eq!(parse_date(Some("yesterday")), None);
        assert_eq!(parse_date(None), None);
    }

    #[test]
    fn test_parse_date_takes_leading_digits() {
        assert_eq!(
            parse_date(Some("2023-12-01T10:00")),
            NaiveDate::from_ymd_opt(2023, 12, 1)
        );
        assert_eq!(
            parse_date(Some("2023-12-01-04")),
            NaiveDate::from_ymd_opt(2023, 12, 1)
        );
        assert_eq!(
            parse_date(Some(" 2023-06-15 ")),
            NaiveDate::from_ymd_opt(2023, 6, 15)
        );
    }

    #[test]
    fn test_parse_date_rolls_overflow_forward() {
        assert_eq!(parse_date(Some("2023-02-29")), NaiveDate::from_ymd_opt(2023, 3, 1));
        assert_eq!(parse_date(Some("2023-02-30")), NaiveDate::from_ymd_opt(2023, 3, 2));
        assert_eq!(parse_date(Some("2023-13-01")), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(parse_date(Some("2023-01-00")), NaiveDate::from_ymd_opt(2022, 12, 31));
        assert_eq!(parse_date(Some("2023-00-15")), NaiveDate::from_ymd_opt(2022, 12, 15));
    }

    #[test]
    fn test_product_requires_positive_price() {
        assert!(validate_product(&product_row("P1", "Ball", "Toys", "10")).is_some());
        assert!(validate_product(&product_row("P1", "Ball", "Toys", "0")).is_none());
        assert!(validate_product(&product_row("P1", "Ball", "Toys", "-3")).is_none());
        assert!(validate_product(&product_row("P1", "Ball", "Toys", "free")).is_none());
    }

    #[test]
    fn test_product_requires_raw_fields() {
        assert!(validate_product(&product_row("", "Ball", "Toys", "10")).is_none());
        assert!(validate_product(&product_row("P1", "", "Toys", "10")).is_none());
        assert!(validate_product(&product_row("P1", "Ball", "", "10")).is_none());
    }

    #[test]
    fn test_product_presence_checked_before_cleaning() {
        // Whitespace is present in the raw row, so the row is admitted and
        // cleaning substitutes the sentinel.
        let product = validate_product(&product_row("P1", "Ball", "  ", "10")).unwrap();
        assert_eq!(product.category, UNKNOWN);
    }

    #[test]
    fn test_products_trimmed() {
        let product = validate_product(&product_row(" P1 ", " Ball ", " Toys ", " 9.5 ")).unwrap();
        assert_eq!(product.id, "P1");
        assert_eq!(product.name, "Ball");
        assert_eq!(product.category, "Toys");
        assert_eq!(product.price, 9.5);
    }

    #[test]
    fn test_duplicate_product_first_wins() {
        let batch = validate_products(vec![
            product_row("P1", "Ball", "Toys", "10"),
            product_row("P1", "Book", "Books", "20"),
            product_row("P2", "Kite", "Toys", "0"),
        ]);
        assert_eq!(batch.products.len(), 1);
        assert_eq!(batch.products[0].name, "Ball");
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.duplicates, 1);
    }

    #[test]
    fn test_sale_rejections() {
        assert!(validate_sale(sale_row("2023-12-01", "P1", "2", "20")).is_ok());
        assert!(validate_sale(sale_row("2023-12-01", "P1", "0", "20")).is_err());
        assert!(validate_sale(sale_row("2023-12-01", "P1", "2", "0")).is_err());
        assert!(validate_sale(sale_row("2023-12-01", "P1", "-1", "20")).is_err());
        assert!(validate_sale(sale_row("2023-02-30", "P1", "2", "20")).is_ok());
        assert!(validate_sale(sale_row("2023-12", "P1", "2", "20")).is_err());
        assert!(validate_sale(sale_row("2023-12-01", "", "2", "20")).is_err());
    }

    #[test]
    fn test_rejected_sale_carries_parsed_values() {
        let rejected = validate_sale(sale_row("2023-12-03", "A", "1", "0")).unwrap_err();
        assert!(rejected.is_valid_date());
        assert_eq!(rejected.quantity, 1.0);
        assert_eq!(rejected.total_amount, 0.0);
        assert_eq!(rejected.product_id.as_deref(), Some("A"));
        assert_eq!(rejected.raw.total_amount.as_deref(), Some("0"));
    }

    #[test]
    fn test_validate_sales_counts_and_range() {
        let batch = validate_sales(
            vec![
                sale_row("2023-12-05", "A", "2", "20"),
                sale_row("bad", "A", "1", "10"),
                sale_row("2023-11-30", "B", "1", "20"),
                sale_row("2023-12-10", "B", "0", "20"),
                sale_row("2023-12-09", "", "1", "20"),
                sale_row("2023-12-08", "A", "1", "0"),
                sale_row("2023-12-07", "A", "3", "30"),
            ],
            3,
        );
        assert_eq!(batch.sales.len(), 3);
        assert_eq!(batch.skipped, 4);
        assert_eq!(batch.rejected_samples.len(), 3);
        assert!(!batch.rejected_samples[0].is_valid_date());
        assert_eq!(
            batch.date_range,
            Some((
                NaiveDate::from_ymd_opt(2023, 11, 30).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 7).unwrap()
            ))
        );
    }

    #[test]
    fn test_validate_sales_empty() {
        let batch = validate_sales(Vec::new(), 3);
        assert!(batch.sales.is_empty());
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.date_range, None);
    }
}
