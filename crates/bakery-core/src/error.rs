//! # Shop Error Types
//!
//! Typed error handling for the storefront backend.
//! Every store, gateway and handler operation returns `Result<T, ShopError>`.

use thiserror::Error;

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Missing or invalid required input
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Caller is not allowed to use this endpoint
    #[error("Unauthorized")]
    Unauthorized,

    /// Targeted row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unsupported method/action combination
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Configuration errors (missing credentials, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Relational store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Gateway answered with something we could not understand
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Network/HTTP error communicating with the gateway
    #[error("Network error: {0}")]
    Network(String),

    /// Gateway returned a non-success status; passed through to the caller
    #[error("Upstream returned HTTP {status}")]
    Upstream { status: u16, body: String },

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Validation(_) => 400,
            ShopError::Unauthorized => 401,
            ShopError::NotFound(_) => 404,
            ShopError::MethodNotAllowed => 405,
            ShopError::Configuration(_) => 500,
            ShopError::Storage(_) => 500,
            ShopError::Gateway(_) => 502,
            ShopError::Network(_) => 503,
            ShopError::Upstream { status, .. } => *status,
            ShopError::Internal(_) => 500,
        }
    }

    /// Message safe to show to API callers.
    ///
    /// Storage, network and internal failures are replaced by a fixed text so
    /// that driver or transport details stay in the server log.
    pub fn public_message(&self) -> String {
        match self {
            ShopError::Validation(msg) => msg.clone(),
            ShopError::NotFound(msg) => msg.clone(),
            ShopError::Configuration(msg) => msg.clone(),
            ShopError::Unauthorized | ShopError::MethodNotAllowed => self.to_string(),
            ShopError::Upstream { .. } => "Payment gateway error".to_string(),
            ShopError::Gateway(_) | ShopError::Network(_) => {
                "Payment gateway unavailable".to_string()
            }
            ShopError::Storage(_) | ShopError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Returns true for errors that indicate a server-side fault
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ShopError::Validation("x".into()).status_code(), 400);
        assert_eq!(ShopError::Unauthorized.status_code(), 401);
        assert_eq!(ShopError::NotFound("x".into()).status_code(), 404);
        assert_eq!(ShopError::MethodNotAllowed.status_code(), 405);
        assert_eq!(ShopError::Storage("x".into()).status_code(), 500);
        assert_eq!(
            ShopError::Upstream {
                status: 401,
                body: "{}".into()
            }
            .status_code(),
            401
        );
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = ShopError::Storage("connection refused at 10.0.0.3:5432".into());
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.is_server_error());

        let err = ShopError::Validation("customer_name is required".into());
        assert_eq!(err.public_message(), "customer_name is required");
        assert!(!err.is_server_error());
    }
}
