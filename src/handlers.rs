// =============================================================================
// HANDLERS MODULE
// =============================================================================
// This module contains all HTTP request handlers (controller layer).
//
// LEARNING NOTES:
// - Handlers are async functions that receive requests and return responses
// - Axum uses "extractors" to parse request data (path params, query, etc.)
// - State is shared via the State<T> extractor
// - Handlers stay thin: parsing and business rules live in ProductService
//
// AXUM EXTRACTORS EXPLAINED:
// - State<T>: Access shared application state
// - Path<T>: Extract path parameters (/products/:id → id)
// - Query<T>: Extract query parameters (?page=1 → page)
// Path and Query come from extract.rs, so their rejections use the JSON
// error envelope.
// =============================================================================

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::error::AppResult;
use crate::extract::{Path, Query};
use crate::metrics;
use crate::models::*;
use crate::query::{LimitParams, ListParams, SearchParams, Showcase, DEFAULT_SHOWCASE_LIMIT};
use crate::AppState;

/// Record request count and latency for a finished handler
fn observe<T>(endpoint: &str, start: Instant, result: &AppResult<T>) {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_code(),
    };
    metrics::record_http_request(
        "GET",
        endpoint,
        status.as_u16(),
        start.elapsed().as_secs_f64(),
    );
}

// =============================================================================
// HEALTH CHECK ENDPOINTS
// =============================================================================

/// Liveness probe - Is the service running?
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "product-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness probe - Is the service ready to handle requests?
///
/// Checks the product store and, when configured, the cache.
///
/// GET /ready
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    let database = state.products.store_healthy().await;
    let cache = state.products.cache_healthy().await;

    let all_healthy = database && cache.unwrap_or(true);
    let status = if all_healthy { "ready" } else { "not_ready" };

    let response = ReadinessResponse {
        status: status.to_string(),
        checks: ReadinessChecks { database, cache },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

// =============================================================================
// METRICS ENDPOINT
// =============================================================================
/// Prometheus metrics endpoint
///
/// GET /metrics
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

// =============================================================================
// PRODUCT API ENDPOINTS
// =============================================================================

// -----------------------------------------------------------------------------
// LIST PRODUCTS
// -----------------------------------------------------------------------------
/// Filtered, sorted, paginated product listing
///
/// GET /api/v1/products?category=dog&tag=daily_deal&sort=price_asc&page=1&limit=12
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "products": [...],
///     "pagination": { "currentPage": 1, "totalPages": 3, ... },
///     "filters": { "category": "dog", "tag": "daily_deal", "sort": "price_asc", ... }
///   }
/// }
/// ```
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<ApiResponse<ProductListResponse>>> {
    let start = Instant::now();

    let result = state.products.list_products(&params).await;
    observe("/api/v1/products", start, &result);

    Ok(Json(ApiResponse::ok(result?)))
}

// -----------------------------------------------------------------------------
// GET SINGLE PRODUCT
// -----------------------------------------------------------------------------
/// GET /api/v1/products/:id
///
/// # Response
/// - 200 OK: product JSON
/// - 400 Bad Request: id is not a UUID
/// - 404 Not Found: no such product, or it is inactive
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let start = Instant::now();

    let result = state.products.get_product(&id).await;
    observe("/api/v1/products/:id", start, &result);

    Ok(Json(ApiResponse::ok(result?)))
}

/// Products from the same category
///
/// GET /api/v1/products/:id/related?limit=8
pub async fn related_products(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let start = Instant::now();

    let limit = params.resolve(DEFAULT_SHOWCASE_LIMIT);
    let result = state.products.related_products(&id, limit).await;
    observe("/api/v1/products/:id/related", start, &result);

    Ok(Json(ApiResponse::ok(result?)))
}

// -----------------------------------------------------------------------------
// SHOWCASES
// -----------------------------------------------------------------------------
async fn showcase(
    state: &AppState,
    kind: Showcase,
    params: &LimitParams,
    endpoint: &str,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let start = Instant::now();

    let limit = params.resolve(DEFAULT_SHOWCASE_LIMIT);
    let result = state.products.showcase(kind, limit).await;
    observe(endpoint, start, &result);

    Ok(Json(ApiResponse::ok(result?)))
}

/// GET /api/v1/products/featured?limit=8
pub async fn featured_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    showcase(&state, Showcase::Featured, &params, "/api/v1/products/featured").await
}

/// GET /api/v1/products/bestsellers?limit=8
pub async fn bestseller_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    let endpoint = "/api/v1/products/bestsellers";
    showcase(&state, Showcase::Bestsellers, &params, endpoint).await
}

/// GET /api/v1/products/deals?limit=8
pub async fn deal_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    showcase(&state, Showcase::Deals, &params, "/api/v1/products/deals").await
}

// -----------------------------------------------------------------------------
// SEARCH
// -----------------------------------------------------------------------------
/// Quick search over name, brand and tags
///
/// GET /api/v1/products/search?query=royal
///
/// # Response
/// - 200 OK: `{ products, total, query }`
/// - 400 Bad Request: `query` missing or blank
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ApiResponse<SearchResponse>>> {
    let start = Instant::now();

    let result = state.products.search(&params).await;
    observe("/api/v1/products/search", start, &result);

    Ok(Json(ApiResponse::ok(result?)))
}

// -----------------------------------------------------------------------------
// FACETS
// -----------------------------------------------------------------------------
/// GET /api/v1/products/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let start = Instant::now();

    let result = state.products.categories().await;
    observe("/api/v1/products/categories", start, &result);

    Ok(Json(ApiResponse::ok(result?)))
}

/// GET /api/v1/products/brands
pub async fn list_brands(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<ApiResponse<Vec<String>>>> {
    let start = Instant::now();

    let result = state.products.brands().await;
    observe("/api/v1/products/brands", start, &result);

    Ok(Json(ApiResponse::ok(result?)))
}
