//! # YooKassa Payments
//!
//! Implementation of the YooKassa v3 payments API: hosted redirect
//! confirmation for creation, and status polling by payment id.

use crate::config::YooKassaConfig;
use async_trait::async_trait;
use bakery_core::{
    GatewayPayment, GatewayPaymentStatus, Money, PaymentGateway, PaymentRequest, ShopError,
    ShopResult,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "yookassa";

/// YooKassa payment gateway
pub struct YooKassaGateway {
    config: YooKassaConfig,
    client: Client,
}

impl YooKassaGateway {
    /// Create a new gateway client; the timeout bounds every call
    pub fn new(config: YooKassaConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShopError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(YooKassaConfig::from_env()?)
    }

    pub fn config(&self) -> &YooKassaConfig {
        &self.config
    }

    fn build_payment_body(request: &PaymentRequest) -> YooKassaCreatePayment {
        YooKassaCreatePayment {
            amount: YooKassaAmount {
                value: request.amount.minor_precision_string(),
                currency: request.amount.currency.as_str().to_string(),
            },
            confirmation: YooKassaConfirmationRequest {
                kind: "redirect".to_string(),
                return_url: request.return_url.clone(),
            },
            capture: true,
            description: request.description.clone(),
            metadata: YooKassaMetadata {
                order_id: request.order_id.to_string(),
            },
        }
    }

    /// Read the body and turn non-success answers into `Upstream` errors
    async fn read_body(response: Response, accepted: &[StatusCode]) -> ShopResult<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        if !accepted.contains(&status) {
            error!("YooKassa API error: status={}, body={}", status, body);
            return Err(ShopError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    fn parse_payment(body: &str) -> ShopResult<GatewayPayment> {
        let payment: YooKassaPayment = serde_json::from_str(body).map_err(|e| {
            ShopError::Gateway(format!("Failed to parse YooKassa response: {}", e))
        })?;
        Ok(payment.into())
    }
}

fn valid_payment_id(payment_id: &str) -> bool {
    !payment_id.is_empty()
        && payment_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl PaymentGateway for YooKassaGateway {
    #[instrument(skip(self, request), fields(order_id = request.order_id))]
    async fn create_payment(&self, request: &PaymentRequest) -> ShopResult<GatewayPayment> {
        let body = Self::build_payment_body(request);
        let url = format!("{}/payments", self.config.api_base_url);

        debug!(
            "Creating YooKassa payment: amount={}, idempotency_key={}",
            body.amount.value, request.idempotency_key
        );

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .header("Idempotence-Key", &request.idempotency_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let body = Self::read_body(response, &[StatusCode::OK, StatusCode::CREATED]).await?;
        let payment = Self::parse_payment(&body)?;

        info!(
            "Created YooKassa payment: id={}, status={:?}",
            payment.id, payment.status
        );

        Ok(payment)
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, payment_id: &str) -> ShopResult<GatewayPayment> {
        if !valid_payment_id(payment_id) {
            return Err(ShopError::Validation(format!(
                "invalid payment_id: {}",
                payment_id
            )));
        }

        let url = format!("{}/payments/{}", self.config.api_base_url, payment_id);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.shop_id, Some(&self.config.secret_key))
            .send()
            .await
            .map_err(|e| ShopError::Network(e.to_string()))?;

        let body = Self::read_body(response, &[StatusCode::OK]).await?;
        let payment = Self::parse_payment(&body)?;

        debug!("YooKassa payment {} is {:?}", payment.id, payment.status);

        Ok(payment)
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

// =============================================================================
// YooKassa API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct YooKassaCreatePayment {
    amount: YooKassaAmount,
    confirmation: YooKassaConfirmationRequest,
    capture: bool,
    description: String,
    metadata: YooKassaMetadata,
}

#[derive(Debug, Serialize)]
struct YooKassaAmount {
    value: String,
    currency: String,
}

#[derive(Debug, Serialize)]
struct YooKassaConfirmationRequest {
    #[serde(rename = "type")]
    kind: String,
    return_url: String,
}

#[derive(Debug, Serialize)]
struct YooKassaMetadata {
    order_id: String,
}

#[derive(Debug, Deserialize)]
struct YooKassaPayment {
    id: String,
    status: GatewayPaymentStatus,
    #[serde(default)]
    paid: bool,
    #[serde(default)]
    amount: Option<Money>,
    #[serde(default)]
    confirmation: Option<YooKassaConfirmation>,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YooKassaConfirmation {
    #[serde(default)]
    confirmation_url: Option<String>,
}

impl From<YooKassaPayment> for GatewayPayment {
    fn from(p: YooKassaPayment) -> Self {
        GatewayPayment {
            id: p.id,
            status: p.status,
            paid: p.paid,
            amount: p.amount,
            confirmation_url: p.confirmation.and_then(|c| c.confirmation_url),
            metadata: p.metadata,
        }
    }
}
