// =============================================================================
// PRODUCT SERVICE - Main Entry Point
// =============================================================================
// This is the main entry point for the Rust-based Product Service.
//
// WHAT THIS SERVICE DOES:
// - Serves the storefront product catalog (read-only)
// - Filtered, sorted, paginated listing plus detail lookups
// - Featured / bestsellers / deals showcases, category and brand facets
// - Exposes Prometheus metrics for observability
// - Optionally caches detail and facet lookups in Redis
// =============================================================================

// -----------------------------------------------------------------------------
// MODULE DECLARATIONS
// -----------------------------------------------------------------------------
mod cache;       // Optional Redis cache (cache.rs)
mod config;      // Configuration loading (config.rs)
mod db;          // ProductStore trait and PostgreSQL store (db.rs)
mod error;       // Error types (error.rs)
mod extract;     // Query/Path extractors with JSON rejections (extract.rs)
mod handlers;    // HTTP request handlers (handlers.rs)
mod metrics;     // Prometheus metrics setup (metrics.rs)
mod models;      // Data structures (models.rs)
mod query;       // Query-string normalization (query.rs)
mod service;     // ProductService (service.rs)

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::ProductCache;
use crate::config::Config;
use crate::db::Database;
use crate::metrics::setup_metrics;
use crate::service::ProductService;

// -----------------------------------------------------------------------------
// APPLICATION STATE
// -----------------------------------------------------------------------------
// Shared by every handler through State<Arc<AppState>>.
pub struct AppState {
    /// Catalog operations over the store and cache
    pub products: ProductService,

    /// Prometheus metrics handle
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}

// -----------------------------------------------------------------------------
// ROUTES
// -----------------------------------------------------------------------------
/// Build the HTTP router.
///
/// Static segments (`/featured`, `/search`, ...) take priority over `/:id`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // ----- Health & Readiness Endpoints -----
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        // ----- Product API Endpoints -----
        .route("/api/v1/products", get(handlers::list_products))
        .route("/api/v1/products/featured", get(handlers::featured_products))
        .route("/api/v1/products/bestsellers", get(handlers::bestseller_products))
        .route("/api/v1/products/deals", get(handlers::deal_products))
        .route("/api/v1/products/categories", get(handlers::list_categories))
        .route("/api/v1/products/brands", get(handlers::list_brands))
        .route("/api/v1/products/search", get(handlers::search_products))
        .route("/api/v1/products/:id", get(handlers::get_product))
        .route("/api/v1/products/:id/related", get(handlers::related_products))
        // ----- Middleware Layers -----
        // The storefront SPA is served from another origin
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// -----------------------------------------------------------------------------
// MAIN FUNCTION
// -----------------------------------------------------------------------------
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -------------------------------------------------------------------------
    // STEP 1: Load environment variables
    // -------------------------------------------------------------------------
    dotenvy::dotenv().ok();

    // -------------------------------------------------------------------------
    // STEP 2: Initialize logging/tracing
    // -------------------------------------------------------------------------
    // RUST_LOG controls log levels, e.g. RUST_LOG=info,product_service=debug
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,product_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting Product Service...");

    // -------------------------------------------------------------------------
    // STEP 3: Load configuration
    // -------------------------------------------------------------------------
    let config = Config::from_env()?;
    info!(
        port = config.port,
        query_timeout_ms = config.query_timeout.as_millis() as u64,
        cache_enabled = config.redis_url.is_some(),
        "Configuration loaded"
    );

    // -------------------------------------------------------------------------
    // STEP 4: Set up Prometheus metrics
    // -------------------------------------------------------------------------
    let metrics_handle = setup_metrics()?;
    info!("Prometheus metrics initialized");

    // -------------------------------------------------------------------------
    // STEP 5: Connect to PostgreSQL database
    // -------------------------------------------------------------------------
    let db = Database::connect(&config.database_url).await?;
    info!("Connected to PostgreSQL");

    db.run_migrations().await?;
    info!("Database migrations completed");

    // -------------------------------------------------------------------------
    // STEP 6: Connect to Redis (optional)
    // -------------------------------------------------------------------------
    let cache = ProductCache::connect(config.redis_url.as_deref(), config.cache_ttl).await?;
    if cache.is_enabled() {
        info!("Connected to Redis");
    } else {
        info!("Redis cache disabled");
    }

    // -------------------------------------------------------------------------
    // STEP 7: Create application state
    // -------------------------------------------------------------------------
    let state = Arc::new(AppState {
        products: ProductService::new(Arc::new(db), cache, config.query_timeout),
        metrics_handle,
    });

    // -------------------------------------------------------------------------
    // STEP 8: Start the HTTP server
    // -------------------------------------------------------------------------
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(address = %addr, "Product Service is listening");

    axum::serve(listener, app).await?;

    Ok(())
}
