//! # Order Notifications
//!
//! The operator gets one email per new order. Sending is best-effort:
//! callers log failures and move on.

use crate::error::ShopResult;
use crate::money::Money;
use crate::order::{DeliveryMethod, NewOrder};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::sync::Arc;

/// Everything the notification email shows
#[derive(Debug, Clone, PartialEq)]
pub struct OrderNotification {
    pub order_id: i32,
    pub order: NewOrder,
    pub created_at: DateTime<Utc>,
}

impl OrderNotification {
    pub fn new(order_id: i32, order: NewOrder) -> Self {
        Self {
            order_id,
            order,
            created_at: Utc::now(),
        }
    }
}

/// Subject and HTML body of a rendered email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the new-order email to the operator
    async fn notify_new_order(&self, notification: &OrderNotification) -> ShopResult<()>;

    /// False when the transport is not configured and sends are skipped
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Type alias for a shared notifier (dynamic dispatch)
pub type BoxedNotifier = Arc<dyn Notifier>;

/// Notifier used when mail settings are incomplete
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify_new_order(&self, notification: &OrderNotification) -> ShopResult<()> {
        tracing::info!(
            order_id = notification.order_id,
            "Mail transport not configured, notification skipped"
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const CELL: &str = "padding: 8px; border-bottom: 1px solid #eee;";
const HEAD: &str = "padding: 10px; border-bottom: 2px solid #0EA5E9;";
const SECTION: &str = "color: #0EA5E9; margin-top: 30px;";

/// Render the fixed new-order document
pub fn render_order_email(notification: &OrderNotification) -> RenderedEmail {
    let order = &notification.order;
    let id = notification.order_id;

    let mut rows = String::new();
    for item in &order.items {
        let price = Money::rub(item.product_price);
        let sum = Money::rub(item.subtotal);
        // Writing to a String cannot fail
        let _ = write!(
            rows,
            r#"
        <tr>
            <td style="{cell}">{name}</td>
            <td style="{cell} text-align: center;">{qty}</td>
            <td style="{cell} text-align: right;">{price}</td>
            <td style="{cell} text-align: right; font-weight: bold;">{sum}</td>
        </tr>"#,
            cell = CELL,
            name = escape_html(&item.product_name),
            qty = item.quantity,
            price = price.display(),
            sum = sum.display(),
        );
    }

    let delivery = match order.delivery_method {
        DeliveryMethod::Pickup => "Pickup at the bakery".to_string(),
        DeliveryMethod::Delivery => format!(
            "Delivery to: {}",
            escape_html(order.delivery_address.as_deref().unwrap_or_default())
        ),
    };

    let comments = order
        .comments
        .as_deref()
        .map(|c| {
            format!(
                r#"<h2 style="{}">Comments</h2><p>{}</p>"#,
                SECTION,
                escape_html(c)
            )
        })
        .unwrap_or_default();

    let html = format!(
        r#"<html>
    <body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
        <div style="background: linear-gradient(135deg, #D3E4FD 0%, #FDE1D3 100%); padding: 30px; text-align: center; border-radius: 10px 10px 0 0;">
            <h1 style="color: #333; margin: 0;">🥐 New order #{id}</h1>
        </div>
        <div style="padding: 30px; background: #fff; border: 1px solid #eee; border-top: none; border-radius: 0 0 10px 10px;">
            <h2 style="color: #0EA5E9; margin-top: 0;">Customer</h2>
            <p><strong>Name:</strong> {name}</p>
            <p><strong>Phone:</strong> {phone}</p>
            <p><strong>Email:</strong> {email}</p>
            <h2 style="{section}">Delivery</h2>
            <p>{delivery}</p>
            {comments}
            <h2 style="{section}">Items</h2>
            <table style="width: 100%; border-collapse: collapse; margin-top: 15px;">
                <thead>
                    <tr style="background: #f8f9fa;">
                        <th style="{head} text-align: left;">Item</th>
                        <th style="{head} text-align: center;">Qty</th>
                        <th style="{head} text-align: right;">Price</th>
                        <th style="{head} text-align: right;">Sum</th>
                    </tr>
                </thead>
                <tbody>{rows}
                </tbody>
            </table>
            <div style="margin-top: 20px; padding: 20px; background: #f8f9fa; border-radius: 8px; text-align: right;">
                <h3 style="margin: 0; color: #0EA5E9;">Total: {total}</h3>
            </div>
            <p style="margin-top: 30px; color: #666; font-size: 14px; text-align: center;">
                Order placed {placed}
            </p>
        </div>
    </body>
</html>"#,
        id = id,
        name = escape_html(&order.customer_name),
        phone = escape_html(&order.customer_phone),
        email = escape_html(order.customer_email.as_deref().unwrap_or_default()),
        section = SECTION,
        head = HEAD,
        delivery = delivery,
        comments = comments,
        rows = rows,
        total = Money::rub(order.total_amount).display(),
        placed = notification.created_at.format("%d.%m.%Y %H:%M UTC"),
    );

    RenderedEmail {
        subject: format!("New order #{} - Sweet Paradise", id),
        html,
    }
}
