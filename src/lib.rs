//! # Ecommerce Analytics
//!
//! **A small e-commerce reporting backend.**
//!
//! Loads a products CSV and a sales CSV into SQLite, then serves read-only
//! sales analytics over HTTP: total revenue in a period, top-selling
//! products, revenue by category, and a searchable product listing
//! annotated with lifetime units sold.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │  CSV files  │──▶│    Loader    │──▶│  SQLite  │
//! │ products/   │   │ clean+verify │   │ products │
//! │ sales       │   └──────────────┘   │ sales    │
//! └─────────────┘                      └────┬─────┘
//!                                           │
//!                       ┌───────────────────┤
//!                       ▼                   ▼
//!                  ┌──────────┐       ┌──────────┐
//!                  │   CLI    │       │   HTTP   │
//!                  │  (ecx)   │       │  (axum)  │
//!                  └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ecx init                          # create database
//! ecx load                          # load products.csv + sales.csv
//! ecx stats                         # check what was loaded
//! ecx report trending --period 7    # query from the CLI
//! ecx serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Schema and index creation (idempotent) |
//! | [`load`] | CSV loader: parse → validate → full-replace |
//! | [`sqlite_store`] | [`store::Store`] over SQLite with SQL aggregation |
//! | [`server`] | Analytics HTTP server (Axum) with CORS |
//! | [`report`] | CLI mirrors of the HTTP endpoints |
//! | [`stats`] | Database statistics |
//!
//! Row validation, window resolution, and the in-process aggregation rules
//! live in the `ecommerce-analytics-core` crate.

pub mod config;
pub mod db;
pub mod load;
pub mod migrate;
pub mod report;
pub mod server;
pub mod sqlite_store;
pub mod stats;

pub use ecommerce_analytics_core::{models, query, store, window};
