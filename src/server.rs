//! Read-only analytics HTTP server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/analytics/total_sales` | Revenue in the period |
//! | `GET`  | `/analytics/trending_products` | Top products by units in the period |
//! | `GET`  | `/analytics/category_sales` | Revenue share per category in the period |
//! | `GET`  | `/products` | Searchable, sorted, paginated product listing |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! The analytics endpoints take `period` = `7` | `30` | `365` (default `30`).
//! Malformed query parameters are never rejected; each falls back to its
//! own default, and a repeated key keeps its first value.
//!
//! # Error Contract
//!
//! ```json
//! { "error": "Server error" }
//! ```
//!
//! Unknown routes answer `404` and any failure inside a handler answers
//! `500`. The underlying error is logged, never returned.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser dashboard
//! can call the API directly.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use ecommerce_analytics_core::models::{
    CategorySales, ProductPage, TotalSales, TrendingProduct,
};
use ecommerce_analytics_core::query::{PeriodParams, ProductListParams, ProductQuery};
use ecommerce_analytics_core::store::Store;
use ecommerce_analytics_core::window::Clock;

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Clock,
    pub trending_limit: usize,
    pub default_limit: u64,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            store,
            clock: config.analytics.clock()?,
            trending_limit: config.analytics.trending_limit,
            default_limit: config.listing.default_limit,
        })
    }
}

/// Starts the HTTP server.
///
/// Opens the SQLite pool once, builds the router around it, and serves on
/// `[server].bind` until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    crate::migrate::create_schema(&pool).await?;
    let state = AppState::new(Arc::new(SqliteStore::new(pool)), config)?;

    match state.clock {
        Clock::System => info!("resolving periods against wall-clock time"),
        Clock::Fixed(now) => info!(%now, "resolving periods against a fixed reference time"),
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("listening on http://{}", config.server.bind);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down");
    Ok(())
}

/// Build the application router over `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/analytics/total_sales", get(handle_total_sales))
        .route("/analytics/trending_products", get(handle_trending_products))
        .route("/analytics/category_sales", get(handle_category_sales))
        .route("/products", get(handle_products))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error type that converts into an Axum HTTP response.
pub struct AppError {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        error!(error = %format!("{:#}", err), "request failed");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Server error",
        }
    }
}

async fn handle_not_found() -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        message: "Endpoint not found",
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /analytics/* ============

/// Decoded query pairs in request order. A query string that cannot be
/// decoded at all is treated as empty.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn pairs(query: QueryPairs) -> Vec<(String, String)> {
    query.map(|Query(p)| p).unwrap_or_default()
}

async fn handle_total_sales(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<TotalSales>, AppError> {
    let window = state.clock.window(PeriodParams::from_pairs(&pairs(query)).period());
    info!(start = %window.start, end = %window.end, "total_sales");

    let total_sales = state.store.total_sales(&window).await?;
    Ok(Json(TotalSales { total_sales }))
}

async fn handle_trending_products(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<Vec<TrendingProduct>>, AppError> {
    let window = state.clock.window(PeriodParams::from_pairs(&pairs(query)).period());
    info!(start = %window.start, end = %window.end, "trending_products");

    let trending = state
        .store
        .trending_products(&window, state.trending_limit)
        .await?;
    Ok(Json(trending))
}

async fn handle_category_sales(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<Vec<CategorySales>>, AppError> {
    let window = state.clock.window(PeriodParams::from_pairs(&pairs(query)).period());
    info!(start = %window.start, end = %window.end, "category_sales");

    let categories = state.store.category_sales(&window).await?;
    Ok(Json(categories))
}

// ============ GET /products ============

async fn handle_products(
    State(state): State<AppState>,
    query: QueryPairs,
) -> Result<Json<ProductPage>, AppError> {
    let query = ProductQuery::from_params(
        &ProductListParams::from_pairs(&pairs(query)),
        state.default_limit,
    );
    info!(?query, "products");

    let page = state.store.list_products(&query).await?;
    Ok(Json(page))
}
