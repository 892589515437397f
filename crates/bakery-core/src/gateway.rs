//! # Payment Gateway Trait
//!
//! Seam between the payment handler and the hosted payment provider.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │        PaymentGateway (trait)            │
//! │  ├── create_payment()                    │
//! │  ├── get_payment()                       │
//! │  └── provider_name()                     │
//! └──────────────────────────────────────────┘
//!                     ▲
//!          ┌──────────┴──────────┐
//!  ┌───────┴───────┐     ┌───────┴───────┐
//!  │ YooKassa      │     │ test doubles  │
//!  │ Gateway       │     │               │
//!  └───────────────┘     └───────────────┘
//! ```

use crate::error::ShopResult;
use crate::money::Money;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the gateway needs to open a hosted payment session
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub order_id: i32,
    pub amount: Money,
    pub description: String,
    pub return_url: String,
    /// Sent as the gateway's idempotency header
    pub idempotency_key: String,
}

impl PaymentRequest {
    /// Default key: one per order per inbound request
    pub fn idempotency_key_for(order_id: i32, request_id: &str) -> String {
        format!("order-{}-{}", order_id, request_id)
    }

    pub fn default_description(order_id: i32) -> String {
        format!("Payment for order #{}", order_id)
    }
}

/// Payment status as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayPaymentStatus {
    Pending,
    WaitingForCapture,
    Succeeded,
    Canceled,
    #[serde(other)]
    Unknown,
}

/// A payment object as returned by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub status: GatewayPaymentStatus,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub amount: Option<Money>,
    /// Hosted page the customer is redirected to (present on creation)
    #[serde(default)]
    pub confirmation_url: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl GatewayPayment {
    pub fn is_succeeded(&self) -> bool {
        self.status == GatewayPaymentStatus::Succeeded
    }

    /// Local order id carried in the payment metadata.
    ///
    /// Accepts both string and numeric encodings.
    pub fn order_id(&self) -> Option<i32> {
        match self.metadata.get("order_id")? {
            serde_json::Value::String(s) => s.parse().ok(),
            serde_json::Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            _ => None,
        }
    }
}

/// Hosted payment provider.
///
/// Non-success HTTP answers from the provider must be reported as
/// `ShopError::Upstream` so the handler can pass status and body through.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a payment session and return the created payment
    async fn create_payment(&self, request: &PaymentRequest) -> ShopResult<GatewayPayment>;

    /// Fetch the current state of a payment
    async fn get_payment(&self, payment_id: &str) -> ShopResult<GatewayPayment>;

    /// Provider name (for logging)
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(metadata: serde_json::Value) -> GatewayPayment {
        serde_json::from_value(serde_json::json!({
            "id": "2d9f1f2c-000f-5000-8000-1d1f8c8d5a2b",
            "status": "succeeded",
            "paid": true,
            "amount": {"value": "7.00", "currency": "RUB"},
            "metadata": metadata
        }))
        .unwrap()
    }

    #[test]
    fn test_order_id_from_metadata() {
        assert_eq!(payment(serde_json::json!({"order_id": "17"})).order_id(), Some(17));
        assert_eq!(payment(serde_json::json!({"order_id": 17})).order_id(), Some(17));
        assert_eq!(payment(serde_json::json!({})).order_id(), None);
        assert_eq!(payment(serde_json::json!({"order_id": "x"})).order_id(), None);
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let p: GatewayPayment = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "status": "refunded_partially"
        }))
        .unwrap();
        assert_eq!(p.status, GatewayPaymentStatus::Unknown);
        assert!(!p.is_succeeded());
        assert!(!p.paid);
    }

    #[test]
    fn test_idempotency_key() {
        assert_eq!(
            PaymentRequest::idempotency_key_for(5, "req-1"),
            "order-5-req-1"
        );
    }
}
