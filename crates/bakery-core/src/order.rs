//! # Order Types
//!
//! Orders, their line items, and the validated intake payload.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ShopError, ShopResult};
use crate::money::{line_subtotal, max_amount, stored_amount};

/// How the customer receives the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Pickup,
    Delivery,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMethod::Pickup => "pickup",
            DeliveryMethod::Delivery => "delivery",
        }
    }
}

/// Fulfillment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    New,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(OrderStatus::New),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "preparing" => Ok(OrderStatus::Preparing),
            "ready" => Ok(OrderStatus::Ready),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ShopError::Validation(format!(
                "unknown order status: {}",
                other
            ))),
        }
    }
}

/// Payment state of an order; `None` on the order means no payment was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Payment method written when an online payment session is created
pub const PAYMENT_METHOD_ONLINE: &str = "online";

/// One cart line as submitted by the storefront
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CartItem {
    /// Product id at the time of purchase
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Order intake request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSubmission {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

/// A line item with its subtotal computed, ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: Option<i32>,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

/// A validated order, ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_method: DeliveryMethod,
    pub delivery_address: Option<String>,
    pub comments: Option<String>,
    pub total_amount: Decimal,
    pub items: Vec<NewOrderItem>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl OrderSubmission {
    /// Check required fields and freeze line prices into subtotals
    pub fn validate(self) -> ShopResult<NewOrder> {
        let customer_name = self.customer_name.trim().to_string();
        let customer_phone = self.customer_phone.trim().to_string();

        if customer_name.is_empty() || customer_phone.is_empty() || self.items.is_empty() {
            return Err(ShopError::Validation(
                "customer_name, customer_phone and items are required".to_string(),
            ));
        }

        let delivery_address = non_blank(self.delivery_address);
        if self.delivery_method == DeliveryMethod::Delivery && delivery_address.is_none() {
            return Err(ShopError::Validation(
                "delivery_address is required for delivery".to_string(),
            ));
        }

        let items = self
            .items
            .into_iter()
            .map(|item| {
                if item.quantity == 0 || i32::try_from(item.quantity).is_err() {
                    return Err(ShopError::Validation(format!(
                        "quantity out of range for item {}",
                        item.name
                    )));
                }
                let price = stored_amount(item.price, "price")?;
                Ok(NewOrderItem {
                    product_id: item.id,
                    subtotal: line_subtotal(price, item.quantity)?,
                    product_name: item.name,
                    product_price: price,
                    quantity: item.quantity,
                })
            })
            .collect::<ShopResult<Vec<_>>>()?;
        let total_amount = stored_amount(self.total_amount, "total_amount")?;

        Ok(NewOrder {
            customer_name,
            customer_phone,
            customer_email: non_blank(self.customer_email),
            delivery_method: self.delivery_method,
            delivery_address: match self.delivery_method {
                DeliveryMethod::Delivery => delivery_address,
                DeliveryMethod::Pickup => None,
            },
            comments: non_blank(self.comments),
            total_amount,
            items,
        })
    }
}

impl NewOrder {
    /// Sum of line subtotals, `None` once it leaves the storable range
    pub fn computed_total(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.subtotal))
            .filter(|total| *total <= max_amount())
    }

    /// True when the client-supplied total disagrees with the line subtotals
    pub fn total_mismatch(&self) -> bool {
        self.computed_total() != Some(self.total_amount)
    }
}

/// A stored line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i32,
    pub product_id: Option<i32>,
    pub product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub product_price: Decimal,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

/// A stored order with its items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i32,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_method: String,
    pub delivery_address: Option<String>,
    pub comments: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub status: String,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub payment_id: Option<String>,
    pub payment_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
}

/// Key used to look orders up on behalf of a customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    Id(i32),
    Phone(String),
    Email(String),
}

impl OrderLookup {
    /// Pick the lookup key from query parameters.
    ///
    /// Precedence is order id, then phone, then email. Empty strings count as
    /// absent.
    pub fn from_params(
        order_id: Option<&str>,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> ShopResult<Self> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        if let Some(id) = present(order_id) {
            let id = id
                .parse::<i32>()
                .map_err(|_| ShopError::Validation(format!("invalid order_id: {}", id)))?;
            return Ok(OrderLookup::Id(id));
        }
        if let Some(phone) = present(phone) {
            return Ok(OrderLookup::Phone(phone.to_string()));
        }
        if let Some(email) = present(email) {
            return Ok(OrderLookup::Email(email.to_string()));
        }

        Err(ShopError::Validation(
            "phone, email or order_id is required".to_string(),
        ))
    }
}
