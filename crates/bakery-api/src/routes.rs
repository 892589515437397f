//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    body::Body,
    http::{header, HeaderName, Method, Request},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - GET  /health, / - Liveness
/// - POST /api/v1/orders - Order intake
/// - GET  /api/v1/orders - Order lookup by phone, email or order_id
/// - *    /api/v1/admin?action= - Admin panel
/// - POST /api/v1/payments - Create a hosted payment
/// - GET  /api/v1/payments?payment_id= - Poll a payment
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(handlers::admin::ADMIN_TOKEN_HEADER),
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(Duration::from_secs(86400));

    let api_routes = Router::new()
        .route(
            "/orders",
            post(handlers::create_order)
                .get(handlers::lookup_orders)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        // Unknown method/action pairs are rejected by the handler itself
        .route(
            "/admin",
            get(handlers::admin)
                .post(handlers::admin)
                .put(handlers::admin)
                .patch(handlers::admin)
                .options(handlers::preflight)
                .fallback(handlers::admin),
        )
        .route(
            "/payments",
            post(handlers::create_payment)
                .get(handlers::poll_payment)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        );

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
            )
        }))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(middleware)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use crate::testing::TestHarness;
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use serde_json::Value;

    #[tokio::test]
    async fn test_health() {
        let server = TestHarness::new().server();

        for path in ["/health", "/"] {
            let body: Value = server.get(path).await.json();
            assert_eq!(body["status"], "healthy");
            assert_eq!(body["service"], "sweet-paradise");
        }
    }

    #[tokio::test]
    async fn test_options_is_empty_ok() {
        let server = TestHarness::new().server();

        for path in ["/api/v1/orders", "/api/v1/admin", "/api/v1/payments"] {
            let response = server.method(axum::http::Method::OPTIONS, path).await;
            response.assert_status(StatusCode::OK);
            assert!(response.text().is_empty());
        }
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let server = TestHarness::new().server();

        let response = server
            .method(axum::http::Method::OPTIONS, "/api/v1/orders")
            .add_header(
                HeaderName::from_static("origin"),
                HeaderValue::from_static("https://shop.example.com"),
            )
            .add_header(
                HeaderName::from_static("access-control-request-method"),
                HeaderValue::from_static("POST"),
            )
            .await;

        response.assert_status(StatusCode::OK);
        assert!(response.text().is_empty());
        assert_eq!(response.header("access-control-allow-origin"), "*");
        assert_eq!(response.header("access-control-max-age"), "86400");
        let methods = response.header("access-control-allow-methods");
        assert!(methods.to_str().unwrap().contains("PATCH"));
    }

    #[tokio::test]
    async fn test_request_id_propagated() {
        let server = TestHarness::new().server();

        let response = server.get("/health").await;
        assert!(!response.header("x-request-id").is_empty());

        let response = server
            .get("/health")
            .add_header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("trace-me"),
            )
            .await;
        assert_eq!(response.header("x-request-id"), "trace-me");
    }
}
