//! # Ecommerce Analytics CLI (`ecx`)
//!
//! ## Usage
//!
//! ```bash
//! ecx --config ./config/ecx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ecx init` | Create the SQLite database and schema |
//! | `ecx load` | Replace products and sales from the CSV files |
//! | `ecx stats` | Summarize the loaded data |
//! | `ecx report <kind>` | Print an analytics report as JSON |
//! | `ecx products` | Print a page of the product listing as JSON |
//! | `ecx serve` | Start the HTTP server |

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

use ecommerce_analytics::query::ProductListParams;
use ecommerce_analytics::report::ReportKind;
use ecommerce_analytics::{config, load, migrate, report, server, stats};

/// Ecommerce Analytics CLI: load sales data and serve reporting endpoints.
#[derive(Parser)]
#[command(
    name = "ecx",
    about = "Ecommerce Analytics: CSV loader and read-only sales analytics API",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ecx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the products and sales tables,
    /// and their indexes. Safe to run repeatedly.
    Init,

    /// Load the products and sales CSV files.
    ///
    /// Validates every row, discards invalid ones, and replaces all
    /// previously loaded products and sales.
    Load {
        /// Products CSV (overrides `[loader].products_csv`).
        #[arg(long)]
        products: Option<PathBuf>,

        /// Sales CSV (overrides `[loader].sales_csv`).
        #[arg(long)]
        sales: Option<PathBuf>,
    },

    /// Show database statistics.
    Stats,

    /// Print an analytics report as JSON.
    Report {
        kind: ReportArg,

        /// Period in days: 7, 30, or 365. Anything else means 30.
        #[arg(long)]
        period: Option<String>,
    },

    /// Print a page of the product listing as JSON.
    Products {
        #[arg(long)]
        page: Option<String>,

        #[arg(long)]
        limit: Option<String>,

        /// id, name, category, price, or totalSales.
        #[arg(long)]
        sort_by: Option<String>,

        /// asc or desc.
        #[arg(long)]
        sort_order: Option<String>,

        /// Case-insensitive substring of the name or category.
        #[arg(long)]
        search: Option<String>,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportArg {
    TotalSales,
    Trending,
    Categories,
}

impl From<ReportArg> for ReportKind {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::TotalSales => ReportKind::TotalSales,
            ReportArg::Trending => ReportKind::Trending,
            ReportArg::Categories => ReportKind::Categories,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays parseable.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Load { products, sales } => {
            load::run_load(&cfg, products, sales).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Report { kind, period } => {
            report::run_report(&cfg, kind.into(), period).await?;
        }
        Commands::Products {
            page,
            limit,
            sort_by,
            sort_order,
            search,
        } => {
            let params = ProductListParams {
                page,
                limit,
                sort_by,
                sort_order,
                search,
            };
            report::run_products(&cfg, params).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
