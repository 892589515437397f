//! Order intake and customer order lookup.

use super::{json_rejection, query_rejection, shop_error_to_response, HandlerError};
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use bakery_core::{Order, OrderLookup, OrderNotification, OrderSubmission};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

/// Create order response
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub message: String,
    pub order_id: i32,
}

/// Order lookup query parameters
#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Order lookup response
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub orders: Vec<Order>,
    pub total: usize,
}

/// Accept a cart from the storefront and persist it as a new order
#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<OrderSubmission>, JsonRejection>,
) -> Result<Json<CreateOrderResponse>, HandlerError> {
    let Json(submission) = payload.map_err(json_rejection)?;
    let order = submission.validate().map_err(shop_error_to_response)?;

    if order.total_mismatch() {
        warn!(
            "Client total {} differs from line subtotals {:?}",
            order.total_amount,
            order.computed_total()
        );
    }

    let order_id = state
        .store
        .create_order(&order)
        .await
        .map_err(shop_error_to_response)?;

    info!(
        order_id,
        items = order.items.len(),
        "Order created: total={}",
        order.total_amount
    );

    let notifier = state.notifier.clone();
    let notification = OrderNotification::new(order_id, order);
    tokio::spawn(async move {
        if let Err(e) = notifier.notify_new_order(&notification).await {
            error!(order_id, "Failed to send order notification: {}", e);
        }
    });

    Ok(Json(CreateOrderResponse {
        message: "Order created".to_string(),
        order_id,
    }))
}

/// Look orders up by id, phone or email
#[instrument(skip(state, params))]
pub async fn lookup_orders(
    State(state): State<AppState>,
    params: Result<Query<LookupParams>, QueryRejection>,
) -> Result<Json<LookupResponse>, HandlerError> {
    let Query(params) = params.map_err(query_rejection)?;
    let lookup = OrderLookup::from_params(
        params.order_id.as_deref(),
        params.phone.as_deref(),
        params.email.as_deref(),
    )
    .map_err(shop_error_to_response)?;

    let orders = state
        .store
        .find_orders(&lookup)
        .await
        .map_err(shop_error_to_response)?;

    info!("Order lookup returned {} orders", orders.len());

    Ok(Json(LookupResponse {
        total: orders.len(),
        orders,
    }))
}
