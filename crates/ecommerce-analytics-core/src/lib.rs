//! # Ecommerce Analytics Core
//!
//! Shared, I/O-free logic for ecommerce-analytics: data models, CSV row
//! cleaning and validation, period windows, typed query parameters, the
//! store abstraction, and the in-process aggregation used by the in-memory
//! store.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or HTTP
//! dependencies.

pub mod analytics;
pub mod clean;
pub mod models;
pub mod query;
pub mod store;
pub mod window;
