// =============================================================================
// METRICS MODULE
// =============================================================================
// This module sets up Prometheus metrics for observability.
//
// LEARNING NOTES:
// - Prometheus uses a "pull" model - it scrapes /metrics endpoint
// - Metrics have types: Counter, Gauge, Histogram, Summary
// - Labels add dimensions to metrics (e.g., endpoint="/api/v1/products")
// - Without an installed recorder the macros are no-ops, so unit tests can
//   call these helpers freely
// =============================================================================

use anyhow::Result;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

// =============================================================================
// METRIC NAMES (Constants)
// =============================================================================

/// HTTP request counter
/// Labels: method, endpoint, status
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";

/// HTTP request duration histogram
/// Labels: method, endpoint
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Store query duration histogram
/// Labels: operation (list/count/find/showcase/...)
pub const DB_QUERY_DURATION_SECONDS: &str = "db_query_duration_seconds";

/// Redis operation duration histogram
/// Labels: operation (get/set)
pub const REDIS_OPERATION_DURATION_SECONDS: &str = "redis_operation_duration_seconds";

/// Cache lookups
/// Labels: result (hit/miss)
pub const CATALOG_CACHE_LOOKUPS_TOTAL: &str = "catalog_cache_lookups_total";

/// Store queries cancelled by the query timeout
/// Labels: operation
pub const CATALOG_QUERY_TIMEOUTS_TOTAL: &str = "catalog_query_timeouts_total";

/// Products returned per listing page
pub const CATALOG_LISTING_RESULTS: &str = "catalog_listing_results";

// =============================================================================
// SETUP FUNCTION
// =============================================================================
/// Initialize the Prometheus recorder and return the render handle
pub fn setup_metrics() -> Result<PrometheusHandle> {
    // 1ms .. 10s, sized for HTTP and database latencies
    let latency_buckets = &[
        0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    // Page sizes up to the 100-item cap
    let result_buckets = &[0.0, 1.0, 4.0, 8.0, 12.0, 24.0, 50.0, 100.0];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full(DB_QUERY_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full(REDIS_OPERATION_DURATION_SECONDS.to_string()),
            latency_buckets,
        )?
        .set_buckets_for_metric(
            Matcher::Full(CATALOG_LISTING_RESULTS.to_string()),
            result_buckets,
        )?
        .install_recorder()?;

    describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests received"
    );

    describe_histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "HTTP request latency in seconds"
    );

    describe_histogram!(
        DB_QUERY_DURATION_SECONDS,
        "Product store query latency in seconds"
    );

    describe_histogram!(
        REDIS_OPERATION_DURATION_SECONDS,
        "Redis operation latency in seconds"
    );

    describe_counter!(
        CATALOG_CACHE_LOOKUPS_TOTAL,
        "Product cache lookups by result"
    );

    describe_counter!(
        CATALOG_QUERY_TIMEOUTS_TOTAL,
        "Store queries cancelled by the query timeout"
    );

    describe_histogram!(
        CATALOG_LISTING_RESULTS,
        "Number of products returned per listing page"
    );

    Ok(handle)
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Record an HTTP request
///
/// # Arguments
/// * `method` - HTTP method (GET, POST, etc.)
/// * `endpoint` - Route pattern (/api/v1/products/:id)
/// * `status` - Response status code (200, 404, 500)
/// * `duration_secs` - Request duration in seconds
pub fn record_http_request(method: &str, endpoint: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        HTTP_REQUEST_DURATION_SECONDS,
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string()
    )
    .record(duration_secs);
}

/// Record store query duration
pub fn record_db_query(operation: &str, duration_secs: f64) {
    histogram!(
        DB_QUERY_DURATION_SECONDS,
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Record Redis operation duration
pub fn record_redis_operation(operation: &str, duration_secs: f64) {
    histogram!(
        REDIS_OPERATION_DURATION_SECONDS,
        "operation" => operation.to_string()
    )
    .record(duration_secs);
}

/// Count a cache hit or miss
pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!(
        CATALOG_CACHE_LOOKUPS_TOTAL,
        "result" => result.to_string()
    )
    .increment(1);
}

/// Count a store query that hit the timeout
pub fn record_query_timeout(operation: &str) {
    counter!(
        CATALOG_QUERY_TIMEOUTS_TOTAL,
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record how many products a listing page returned
pub fn record_listing_results(count: usize) {
    histogram!(CATALOG_LISTING_RESULTS).record(count as f64);
}
