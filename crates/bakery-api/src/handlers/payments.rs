//! Hosted payment creation and status polling.

use super::{json_rejection, query_rejection, request_id, shop_error_to_response, HandlerError};
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::HeaderMap,
    Json,
};
use bakery_core::{
    GatewayPaymentStatus, Money, OrderLookup, PaymentRequest, ShopError, ShopResult,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Actions accepted on `POST /api/v1/payments`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentAction {
    CreatePayment,
}

impl PaymentAction {
    pub fn resolve(action: Option<&str>) -> ShopResult<Self> {
        match action {
            Some("create_payment") => Ok(PaymentAction::CreatePayment),
            other => Err(ShopError::Validation(format!(
                "unsupported payment action: {:?}",
                other
            ))),
        }
    }
}

/// Payment creation request
#[derive(Debug, Default, Deserialize)]
pub struct CreatePaymentBody {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub order_id: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Payment creation response
#[derive(Debug, Serialize)]
pub struct CreatePaymentResponse {
    pub payment_id: String,
    pub payment_url: Option<String>,
    pub status: GatewayPaymentStatus,
}

/// Poll query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PollParams {
    #[serde(default)]
    pub payment_id: Option<String>,
}

/// Poll response
#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub payment_id: String,
    pub status: GatewayPaymentStatus,
    pub paid: bool,
    pub amount: Option<Money>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Open a hosted payment session for an existing order
#[instrument(skip(state, headers, payload))]
pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreatePaymentBody>, JsonRejection>,
) -> Result<Json<CreatePaymentResponse>, HandlerError> {
    let Json(body) = payload.map_err(json_rejection)?;
    let request_id = request_id(&headers);

    start_payment(&state, body, &request_id)
        .await
        .map(Json)
        .map_err(shop_error_to_response)
}

async fn start_payment(
    state: &AppState,
    body: CreatePaymentBody,
    request_id: &str,
) -> ShopResult<CreatePaymentResponse> {
    match PaymentAction::resolve(body.action.as_deref())? {
        PaymentAction::CreatePayment => {}
    }

    let (order_id, amount) = match (body.order_id, body.amount) {
        (Some(id), Some(amount)) if amount > Decimal::ZERO => (id, amount),
        _ => {
            return Err(ShopError::Validation(
                "order_id and a positive amount are required".to_string(),
            ))
        }
    };

    let gateway = state.gateway()?;

    if state
        .store
        .find_orders(&OrderLookup::Id(order_id))
        .await?
        .is_empty()
    {
        return Err(ShopError::NotFound(format!("order {}", order_id)));
    }

    let request = PaymentRequest {
        order_id,
        amount: Money::rub(amount),
        description: non_blank(body.description)
            .unwrap_or_else(|| PaymentRequest::default_description(order_id)),
        return_url: non_blank(body.return_url)
            .unwrap_or_else(|| state.config.payment_return_url.clone()),
        idempotency_key: non_blank(body.idempotency_key)
            .unwrap_or_else(|| PaymentRequest::idempotency_key_for(order_id, request_id)),
    };

    let payment = gateway.create_payment(&request).await?;

    if !state
        .store
        .attach_payment(order_id, &payment.id, payment.confirmation_url.as_deref())
        .await?
    {
        warn!(order_id, "Order vanished before payment could be attached");
    }

    info!(
        order_id,
        payment_id = %payment.id,
        provider = gateway.provider_name(),
        "Payment created: amount={}",
        request.amount.display()
    );

    Ok(CreatePaymentResponse {
        payment_id: payment.id,
        payment_url: payment.confirmation_url,
        status: payment.status,
    })
}

/// Check a payment with the gateway and mark its order paid on success
pub async fn poll_payment(
    State(state): State<AppState>,
    params: Result<Query<PollParams>, QueryRejection>,
) -> Result<Json<PollResponse>, HandlerError> {
    let Query(params) = params.map_err(query_rejection)?;
    check_payment(&state, params)
        .await
        .map(Json)
        .map_err(shop_error_to_response)
}

#[instrument(skip(state, params), fields(payment_id = ?params.payment_id))]
async fn check_payment(state: &AppState, params: PollParams) -> ShopResult<PollResponse> {
    let payment_id = non_blank(params.payment_id)
        .ok_or_else(|| ShopError::Validation("payment_id is required".to_string()))?;

    let gateway = state.gateway()?;
    let payment = gateway.get_payment(&payment_id).await?;

    if payment.is_succeeded() {
        match payment.order_id() {
            Some(order_id) => {
                if state.store.mark_paid(order_id).await? {
                    info!(order_id, "Order marked paid");
                } else {
                    warn!(order_id, "Paid payment references an unknown order");
                }
            }
            None => warn!("Succeeded payment carries no order_id metadata"),
        }
    }

    Ok(PollResponse {
        payment_id: payment.id,
        status: payment.status,
        paid: payment.paid,
        amount: payment.amount,
    })
}
