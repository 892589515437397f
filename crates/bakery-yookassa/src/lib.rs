//! # bakery-yookassa
//!
//! YooKassa payment gateway for the Sweet Paradise storefront backend.
//!
//! Payments use the hosted redirect flow: the shop creates a payment,
//! sends the customer to `confirmation_url`, and later polls the payment
//! by id until it reports `succeeded`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bakery_yookassa::YooKassaGateway;
//! use bakery_core::{Money, PaymentGateway, PaymentRequest};
//!
//! // Reads YUKASSA_SHOP_ID / YUKASSA_SECRET_KEY
//! let gateway = YooKassaGateway::from_env()?;
//!
//! let payment = gateway.create_payment(&PaymentRequest {
//!     order_id: 42,
//!     amount: Money::rub(total),
//!     description: PaymentRequest::default_description(42),
//!     return_url: "https://example.com/orders".into(),
//!     idempotency_key: PaymentRequest::idempotency_key_for(42, request_id),
//! }).await?;
//!
//! // Redirect the customer to payment.confirmation_url
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::YooKassaGateway;
pub use config::YooKassaConfig;
