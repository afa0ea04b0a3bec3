// =============================================================================
// ERROR MODULE
// =============================================================================
// This module defines custom error types and their HTTP responses.
//
// LEARNING NOTES:
// - Rust doesn't have exceptions; it uses Result<T, E> for error handling
// - thiserror crate makes defining error types easy
// - We convert our errors to HTTP responses using Axum's IntoResponse
//
// ERROR TAXONOMY:
// - BadRequest: the caller sent something we refuse before touching the store
// - NotFound:   missing OR inactive product (indistinguishable on purpose)
// - Timeout:    the store did not answer within the query timeout
// - Store:      the store answered with an error
// =============================================================================

use axum::{
    extract::rejection::{PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;

use crate::models::ErrorResponse;

// =============================================================================
// CUSTOM ERROR TYPE
// =============================================================================
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid request data (malformed id, blank search term, unparseable
    /// query string)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource doesn't exist or isn't visible
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store query exceeded the configured timeout
    #[error("Store query timed out after {0:?}")]
    Timeout(Duration),

    /// Store query failed
    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code returned in the `error` field
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Timeout(_) => "SERVICE_UNAVAILABLE",
            AppError::Store(_) => "DATABASE_ERROR",
        }
    }
}

// -----------------------------------------------------------------------------
// EXTRACTOR REJECTIONS
// -----------------------------------------------------------------------------
// Used by the wrappers in extract.rs
impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(format!("Invalid path: {}", rejection.body_text()))
    }
}

// =============================================================================
// HTTP RESPONSE CONVERSION
// =============================================================================
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.code();

        let message = match &self {
            AppError::BadRequest(msg) | AppError::NotFound(msg) => msg.clone(),

            // 503: the caller may retry later
            AppError::Timeout(_) => "The product store is temporarily unavailable".to_string(),

            // 500: details stay in the logs
            AppError::Store(_) => "A database error occurred".to_string(),
        };

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                error = %self,
                "Request failed"
            );
        } else {
            tracing::debug!(
                error_code = error_code,
                message = %message,
                "Request rejected"
            );
        }

        let body = ErrorResponse::with_code(message, error_code);

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// RESULT TYPE ALIAS
// =============================================================================
pub type AppResult<T> = Result<T, AppError>;
