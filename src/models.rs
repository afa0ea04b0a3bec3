// =============================================================================
// MODELS MODULE
// =============================================================================
// This module defines the data structures used throughout the service.
//
// LEARNING NOTES:
// - Rust uses structs to define data structures
// - Derive macros automatically implement common traits
// - Serde handles JSON serialization/deserialization
// - #[serde(rename = "...")] keeps the wire names the storefront already
//   consumes, while the Rust fields stay snake_case
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::query::AppliedFilters;

// =============================================================================
// CATEGORY REFERENCE
// =============================================================================
/// The category a product belongs to, populated from the `categories` table
/// on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: Uuid,

    /// Display name, e.g. "Thức ăn cho chó"
    pub name: String,

    /// Free-form grouping, "general" unless set
    #[serde(rename = "type")]
    pub kind: String,
}

// =============================================================================
// PRODUCT
// =============================================================================
// A catalog entry. The service never writes products; admin tooling owns
// their lifecycle.
//
// DERIVE MACROS EXPLAINED:
// - Serialize: Converts struct to JSON (for API responses)
// - Deserialize: Converts JSON back to struct (for cached entries)
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,

    pub name: String,

    pub description: String,

    pub category: CategoryRef,

    #[serde(default)]
    pub brand: Option<String>,

    /// Price in VND (no minor unit)
    pub price: i64,

    /// Always below `price` when present
    #[serde(default)]
    pub sale_price: Option<i64>,

    pub stock_quantity: i32,

    /// Ordered image URLs, first one is the cover
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Average review score, 0 to 5
    pub rating: f64,

    #[serde(rename = "salesCount")]
    pub sales_count: i32,

    /// Number of reviews received
    pub reviews: i32,

    #[serde(rename = "isNew")]
    pub is_new: bool,

    /// A value above zero marks the product as a deal
    pub discount: f64,

    /// Inactive products are hidden from detail lookups
    pub is_active: bool,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// API RESPONSE STRUCTURES
// =============================================================================
// Every successful response is wrapped in `{ "success": true, "data": ... }`.

/// Success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// -----------------------------------------------------------------------------
// PAGINATION
// -----------------------------------------------------------------------------
/// Page metadata returned alongside a listing
///
/// # Example JSON
/// ```json
/// {
///   "currentPage": 2,
///   "totalPages": 5,
///   "totalProducts": 57,
///   "limit": 12,
///   "hasNextPage": true,
///   "hasPrevPage": true
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_products: u64,
    pub limit: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    /// Derive page metadata from the requested page, page size and the total
    /// number of matching products.
    pub fn new(current_page: u32, limit: u32, total_products: u64) -> Self {
        let total_pages = total_products.div_ceil(u64::from(limit.max(1)));

        Self {
            current_page,
            total_pages,
            total_products,
            limit,
            has_next_page: u64::from(current_page) < total_pages,
            has_prev_page: current_page > 1,
        }
    }
}

/// `data` payload of `GET /api/v1/products`
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
    pub filters: AppliedFilters,
}

/// `data` payload of `GET /api/v1/products/search`
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub products: Vec<Product>,
    pub total: usize,
    pub query: String,
}

// =============================================================================
// HEALTH CHECK RESPONSES
// =============================================================================

/// Simple health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Detailed readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

/// Individual dependency health checks
#[derive(Debug, Serialize)]
pub struct ReadinessChecks {
    pub database: bool,

    /// Absent when no cache is configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
}

// =============================================================================
// ERROR RESPONSES
// =============================================================================

/// API error response body: `{ "success": false, "message": ..., "error": ... }`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,

    /// Human-readable error message
    pub message: String,

    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: Some(code.into()),
            ..Self::new(message)
        }
    }
}
