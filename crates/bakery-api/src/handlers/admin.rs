//! Admin panel API.
//!
//! One endpoint, many operations: the HTTP method and the `action` query
//! parameter select an [`AdminAction`], and each action parses its own body.

use super::{query_rejection, shop_error_to_response, HandlerError};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, Method},
    Json,
};
use bakery_core::{OrderStatus, ProductDraft, ShopError, ShopResult};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

/// Header carrying the admin token when `ADMIN_TOKEN` is configured
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin query parameters
#[derive(Debug, Default, Deserialize)]
pub struct AdminParams {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Every operation the admin endpoint supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    ListProducts,
    ListOrders,
    ListCategories,
    CreateProduct,
    UpdateProduct,
    UpdateOrderStatus,
}

impl AdminAction {
    /// Resolve the `(method, action)` pair; anything else is a bad request
    pub fn resolve(method: &Method, action: &str) -> ShopResult<Self> {
        let write = *method == Method::PUT || *method == Method::PATCH;

        match (action, method) {
            ("products", &Method::GET) => Ok(AdminAction::ListProducts),
            ("orders", &Method::GET) => Ok(AdminAction::ListOrders),
            ("categories", &Method::GET) => Ok(AdminAction::ListCategories),
            ("product", &Method::POST) => Ok(AdminAction::CreateProduct),
            ("product", _) if write => Ok(AdminAction::UpdateProduct),
            ("order_status", _) if write => Ok(AdminAction::UpdateOrderStatus),
            _ => Err(ShopError::Validation(format!(
                "unsupported admin request: {} action={:?}",
                method, action
            ))),
        }
    }
}

/// Order status update body
#[derive(Debug, Deserialize)]
pub struct OrderStatusUpdate {
    #[serde(default)]
    pub order_id: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Constant-time token comparison
fn token_matches(expected: &str, given: &str) -> bool {
    expected.len() == given.len()
        && expected
            .bytes()
            .zip(given.bytes())
            .fold(0, |acc, (x, y)| acc | (x ^ y))
            == 0
}

/// Gate admin access when a token is configured
fn authorize(state: &AppState, headers: &HeaderMap) -> ShopResult<()> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Ok(());
    };

    let given = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if token_matches(expected, given) {
        Ok(())
    } else {
        Err(ShopError::Unauthorized)
    }
}

/// Parse a JSON body; an empty body reads as `{}`
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> ShopResult<T> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        body
    };
    serde_json::from_slice(raw).map_err(|e| ShopError::Validation(format!("invalid body: {}", e)))
}

/// Admin endpoint dispatcher
#[instrument(skip(state, headers, params, body))]
pub async fn admin(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    params: Result<Query<AdminParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<Value>, HandlerError> {
    authorize(&state, &headers).map_err(shop_error_to_response)?;
    let Query(params) = params.map_err(query_rejection)?;

    let action = AdminAction::resolve(&method, params.action.as_deref().unwrap_or_default())
        .map_err(shop_error_to_response)?;

    run(&state, action, &params, &body)
        .await
        .map(Json)
        .map_err(shop_error_to_response)
}

#[instrument(skip(state, params, body))]
async fn run(
    state: &AppState,
    action: AdminAction,
    params: &AdminParams,
    body: &Bytes,
) -> ShopResult<Value> {
    match action {
        AdminAction::ListProducts => {
            let products = state.store.list_products().await?;
            Ok(json!({ "products": products }))
        }
        AdminAction::ListOrders => {
            let status = params
                .status
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::parse::<OrderStatus>)
                .transpose()?;
            let orders = state.store.list_orders(status).await?;
            Ok(json!({ "orders": orders }))
        }
        AdminAction::ListCategories => {
            let categories = state.store.list_categories().await?;
            Ok(json!({ "categories": categories }))
        }
        AdminAction::CreateProduct => {
            let fields = parse_body::<ProductDraft>(body)?.for_create()?;
            let id = state.store.create_product(&fields).await?;
            info!(product_id = id, "Product created: {}", fields.name);
            Ok(json!({ "id": id, "message": "Product created" }))
        }
        AdminAction::UpdateProduct => {
            let (id, fields) = parse_body::<ProductDraft>(body)?.for_update()?;
            if !state.store.update_product(id, &fields).await? {
                return Err(ShopError::NotFound(format!("product {}", id)));
            }
            info!(product_id = id, "Product updated");
            Ok(json!({ "message": "Product updated" }))
        }
        AdminAction::UpdateOrderStatus => {
            let update: OrderStatusUpdate = parse_body(body)?;
            let order_id = update
                .order_id
                .ok_or_else(|| ShopError::Validation("order_id is required".to_string()))?;
            let status: OrderStatus = update
                .status
                .as_deref()
                .ok_or_else(|| ShopError::Validation("status is required".to_string()))?
                .parse()?;

            if !state.store.update_order_status(order_id, status).await? {
                return Err(ShopError::NotFound(format!("order {}", order_id)));
            }
            info!(order_id, "Order status set to {}", status.as_str());
            Ok(json!({ "message": "Order status updated" }))
        }
    }
}
