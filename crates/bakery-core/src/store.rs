//! # Order Store Trait
//!
//! The relational store is the sole source of truth for products,
//! categories, orders and order items. Implementations must make
//! `create_order` atomic: either the order and all of its items are
//! persisted, or nothing is.

use crate::catalog::{Category, Product, ProductFields};
use crate::error::ShopResult;
use crate::order::{NewOrder, Order, OrderLookup, OrderStatus};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order with status `new` and its items; returns the order id
    async fn create_order(&self, order: &NewOrder) -> ShopResult<i32>;

    /// Orders matching the lookup key, newest first, items attached
    async fn find_orders(&self, lookup: &OrderLookup) -> ShopResult<Vec<Order>>;

    /// All orders (optionally filtered by status), newest first, items attached
    async fn list_orders(&self, status: Option<OrderStatus>) -> ShopResult<Vec<Order>>;

    /// Returns false when no order has this id
    async fn update_order_status(&self, order_id: i32, status: OrderStatus) -> ShopResult<bool>;

    /// Record a freshly created online payment (status `pending`)
    async fn attach_payment(
        &self,
        order_id: i32,
        payment_id: &str,
        payment_url: Option<&str>,
    ) -> ShopResult<bool>;

    /// Set payment status `paid` and order status `confirmed`.
    /// Unconditional; running it twice leaves the same row.
    async fn mark_paid(&self, order_id: i32) -> ShopResult<bool>;

    /// Products joined with category name/slug, newest first
    async fn list_products(&self) -> ShopResult<Vec<Product>>;

    /// Categories ordered by name
    async fn list_categories(&self) -> ShopResult<Vec<Category>>;

    async fn create_product(&self, fields: &ProductFields) -> ShopResult<i32>;

    /// Full-row overwrite; returns false when no product has this id
    async fn update_product(&self, product_id: i32, fields: &ProductFields) -> ShopResult<bool>;
}

/// Type alias for a shared store (dynamic dispatch)
pub type BoxedOrderStore = Arc<dyn OrderStore>;
