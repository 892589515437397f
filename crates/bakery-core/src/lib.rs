//! # bakery-core
//!
//! Core types and traits for the Sweet Paradise storefront backend.
//!
//! This crate provides:
//! - `OrderSubmission` / `NewOrder` for cart validation at intake
//! - `Order`, `OrderItem`, `Product` and `Category` as stored rows
//! - `OrderStore` trait for the relational store
//! - `PaymentGateway` trait for hosted payment providers
//! - `Notifier` trait and the new-order email renderer
//! - `ShopError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use bakery_core::{OrderSubmission, OrderStore};
//!
//! let submission: OrderSubmission = serde_json::from_str(body)?;
//! let order = submission.validate()?;
//! let order_id = store.create_order(&order).await?;
//! ```

pub mod catalog;
pub mod error;
pub mod gateway;
pub mod money;
pub mod notify;
pub mod order;
pub mod store;

// Re-exports for convenience
pub use catalog::{Category, Product, ProductDraft, ProductFields};
pub use error::{ShopError, ShopResult};
pub use gateway::{
    BoxedPaymentGateway, GatewayPayment, GatewayPaymentStatus, PaymentGateway, PaymentRequest,
};
pub use money::{line_subtotal, max_amount, round_minor, stored_amount, Currency, Money};
pub use notify::{
    render_order_email, BoxedNotifier, DisabledNotifier, Notifier, OrderNotification,
    RenderedEmail,
};
pub use order::{
    CartItem, DeliveryMethod, NewOrder, NewOrderItem, Order, OrderItem, OrderLookup,
    OrderStatus, OrderSubmission, PaymentStatus, PAYMENT_METHOD_ONLINE,
};
pub use store::{BoxedOrderStore, OrderStore};
