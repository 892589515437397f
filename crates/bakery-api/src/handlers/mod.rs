//! # Request Handlers
//!
//! Axum request handlers for the storefront API, plus the shared error
//! response shape.

pub mod admin;
pub mod orders;
pub mod payments;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bakery_core::ShopError;
use serde::Serialize;
use tracing::{error, warn};

pub use admin::admin;
pub use orders::{create_order, lookup_orders};
pub use payments::{create_payment, poll_payment};

// =============================================================================
// Error Response
// =============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// What every handler returns on failure
pub type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Convert a `ShopError` into a response, logging server-side faults.
///
/// Only `ShopError::public_message` reaches the caller; gateway bodies are
/// passed through as `details` for upstream errors.
pub fn shop_error_to_response(err: ShopError) -> HandlerError {
    let code = err.status_code();

    if err.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }

    let mut response = ErrorResponse::new(err.public_message(), code);
    if let ShopError::Upstream { body, .. } = err {
        response = response.with_details(body);
    }

    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

/// Malformed JSON bodies are validation errors
pub fn json_rejection(rejection: JsonRejection) -> HandlerError {
    shop_error_to_response(ShopError::Validation(rejection.body_text()))
}

/// Malformed query strings get the same JSON error shape
pub fn query_rejection(rejection: QueryRejection) -> HandlerError {
    shop_error_to_response(ShopError::Validation(rejection.body_text()))
}

/// Correlation id set by the request-id layer
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sweet-paradise",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Bare `OPTIONS` requests; CORS preflights are answered by the CORS layer
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Fallback for methods a route does not serve
pub async fn method_not_allowed() -> HandlerError {
    shop_error_to_response(ShopError::MethodNotAllowed)
}
