//! TOML configuration parsing and validation.
//!
//! ```toml
//! [db]
//! path = "./data/ecommerce.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:5000"
//!
//! [loader]
//! products_csv = "./products.csv"
//! sales_csv = "./sales.csv"
//!
//! [analytics]
//! now = "2023-12-31"   # optional; wall-clock UTC when absent
//! ```

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use ecommerce_analytics_core::window::Clock;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoaderConfig {
    #[serde(default = "default_products_csv")]
    pub products_csv: PathBuf,
    #[serde(default = "default_sales_csv")]
    pub sales_csv: PathBuf,
    #[serde(default = "default_rejected_sample_limit")]
    pub rejected_sample_limit: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            products_csv: default_products_csv(),
            sales_csv: default_sales_csv(),
            rejected_sample_limit: default_rejected_sample_limit(),
        }
    }
}

fn default_products_csv() -> PathBuf {
    PathBuf::from("products.csv")
}
fn default_sales_csv() -> PathBuf {
    PathBuf::from("sales.csv")
}
/// Fewest rejected sale rows a load must surface.
pub const MIN_REJECTED_SAMPLES: usize = 3;

fn default_rejected_sample_limit() -> usize {
    MIN_REJECTED_SAMPLES
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Fixed reference "now" (`YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`, UTC).
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            now: None,
            trending_limit: default_trending_limit(),
        }
    }
}

fn default_trending_limit() -> usize {
    5
}

impl AnalyticsConfig {
    /// The clock windows are resolved against.
    pub fn clock(&self) -> Result<Clock> {
        match self.now.as_deref() {
            None => Ok(Clock::System),
            Some(raw) => parse_reference_now(raw)
                .map(Clock::Fixed)
                .with_context(|| format!("analytics.now is not a valid date or datetime: '{}'", raw)),
        }
    }
}

fn parse_reference_now(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .context("midnight is always representable");
    }
    Ok(NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")?)
}

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    #[serde(default = "default_listing_limit")]
    pub default_limit: u64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_limit: default_listing_limit(),
        }
    }
}

fn default_listing_limit() -> u64 {
    ecommerce_analytics_core::query::DEFAULT_LIMIT
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    if config.loader.rejected_sample_limit < MIN_REJECTED_SAMPLES {
        anyhow::bail!(
            "loader.rejected_sample_limit must be >= {}",
            MIN_REJECTED_SAMPLES
        );
    }

    if config.analytics.trending_limit == 0 {
        anyhow::bail!("analytics.trending_limit must be > 0");
    }

    if config.listing.default_limit == 0 {
        anyhow::bail!("listing.default_limit must be > 0");
    }

    // Surface a malformed reference date at startup rather than per request.
    config.analytics.clock()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Result<Config> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("ecx.toml");
        std::fs::write(
            &path,
            format!(
                "[db]\npath = \"./data/x.sqlite\"\n\n[server]\nbind = \"127.0.0.1:5000\"\n\n{}",
                extra
            ),
        )?;
        load_config(&path)
    }

    #[test]
    fn test_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.loader.rejected_sample_limit, 3);
        assert_eq!(config.analytics.trending_limit, 5);
        assert_eq!(config.listing.default_limit, 10);
        assert_eq!(config.analytics.clock().unwrap(), Clock::System);
    }

    #[test]
    fn test_fixed_now() {
        let config = parse("[analytics]\nnow = \"2023-12-31\"\n").unwrap();
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(config.analytics.clock().unwrap(), Clock::Fixed(expected));

        let config = parse("[analytics]\nnow = \"2023-12-31T18:30:00\"\n").unwrap();
        let expected = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        assert_eq!(config.analytics.clock().unwrap(), Clock::Fixed(expected));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(parse("[analytics]\nnow = \"last tuesday\"\n").is_err());
        assert!(parse("[analytics]\ntrending_limit = 0\n").is_err());
        assert!(parse("[listing]\ndefault_limit = 0\n").is_err());
    }

    #[test]
    fn test_rejected_sample_limit_floor() {
        assert!(parse("[loader]\nrejected_sample_limit = 0\n").is_err());
        assert!(parse("[loader]\nrejected_sample_limit = 2\n").is_err());
        let config = parse("[loader]\nrejected_sample_limit = 10\n").unwrap();
        assert_eq!(config.loader.rejected_sample_limit, 10);
    }
}
