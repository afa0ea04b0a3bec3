// =============================================================================
// EXTRACTORS
// =============================================================================
// Query and Path wrappers whose rejections become AppError, so a request
// that axum cannot parse still gets the JSON error envelope.
// =============================================================================

use axum::extract::FromRequestParts;

use crate::error::AppError;

/// `axum::extract::Query` with `AppError` as its rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// `axum::extract::Path` with `AppError` as its rejection
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);
