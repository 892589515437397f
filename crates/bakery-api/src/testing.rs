//! In-memory doubles for handler tests.

use crate::routes::create_router;
use crate::state::{AppConfig, AppState};
use async_trait::async_trait;
use axum_test::TestServer;
use bakery_core::{
    BoxedNotifier, BoxedOrderStore, BoxedPaymentGateway, Category, GatewayPayment,
    GatewayPaymentStatus, Money, NewOrder, Notifier, Order, OrderItem, OrderLookup,
    OrderNotification, OrderStatus, OrderStore, PaymentGateway, PaymentRequest, PaymentStatus,
    Product, ProductFields, ShopError, ShopResult, PAYMENT_METHOD_ONLINE,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// The documented intake example: two croissants at 3.50
pub fn intake_example() -> serde_json::Value {
    serde_json::json!({
        "customer_name": "Ann",
        "customer_phone": "+1555",
        "items": [{"id": 1, "name": "Croissant", "price": 3.5, "quantity": 2}],
        "total_amount": 7
    })
}

// =============================================================================
// Store
// =============================================================================

#[derive(Default)]
struct Tables {
    orders: Vec<Order>,
    products: Vec<Product>,
    categories: Vec<Category>,
    next_order_id: i32,
    next_item_id: i32,
    next_product_id: i32,
}

/// `OrderStore` over vectors; ids grow, so "newest first" is "highest id first"
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut tables = store.tables.lock().unwrap();
            for (id, name, slug) in [(1, "Pastry", "pastry"), (2, "Bread", "bread"), (3, "Cakes", "cakes")]
            {
                tables.categories.push(Category {
                    id,
                    name: name.to_string(),
                    slug: slug.to_string(),
                    created_at: Some(Utc::now()),
                });
            }
        }
        store
    }

    /// Make every write fail with a storage error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn all_orders(&self) -> Vec<Order> {
        let mut orders = self.tables.lock().unwrap().orders.clone();
        orders.sort_by(|a, b| b.id.cmp(&a.id));
        orders
    }

    /// Change a catalog price the way an admin edit would
    fn check_writable(&self) -> ShopResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ShopError::Storage("connection refused".to_string()));
        }
        Ok(())
    }

    fn update_order(&self, order_id: i32, apply: impl FnOnce(&mut Order)) -> ShopResult<bool> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();
        match tables.orders.iter_mut().find(|o| o.id == order_id) {
            Some(order) => {
                apply(order);
                order.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn select(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        self.all_orders().into_iter().filter(keep).collect()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(&self, order: &NewOrder) -> ShopResult<i32> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();

        tables.next_order_id += 1;
        let id = tables.next_order_id;

        let mut items = Vec::new();
        for item in &order.items {
            tables.next_item_id += 1;
            items.push(OrderItem {
                id: tables.next_item_id,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                product_price: item.product_price,
                quantity: item.quantity as i32,
                subtotal: item.subtotal,
            });
        }

        tables.orders.push(Order {
            id,
            customer_name: order.customer_name.clone(),
            customer_phone: order.customer_phone.clone(),
            customer_email: order.customer_email.clone(),
            delivery_method: order.delivery_method.as_str().to_string(),
            delivery_address: order.delivery_address.clone(),
            comments: order.comments.clone(),
            total_amount: order.total_amount,
            status: OrderStatus::New.as_str().to_string(),
            payment_method: None,
            payment_status: None,
            payment_id: None,
            payment_url: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            items,
        });

        Ok(id)
    }

    async fn find_orders(&self, lookup: &OrderLookup) -> ShopResult<Vec<Order>> {
        Ok(self.select(|o| match lookup {
            OrderLookup::Id(id) => o.id == *id,
            OrderLookup::Phone(phone) => &o.customer_phone == phone,
            OrderLookup::Email(email) => o.customer_email.as_ref() == Some(email),
        }))
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> ShopResult<Vec<Order>> {
        Ok(self.select(|o| status.map_or(true, |s| o.status == s.as_str())))
    }

    async fn update_order_status(&self, order_id: i32, status: OrderStatus) -> ShopResult<bool> {
        self.update_order(order_id, |o| o.status = status.as_str().to_string())
    }

    async fn attach_payment(
        &self,
        order_id: i32,
        payment_id: &str,
        payment_url: Option<&str>,
    ) -> ShopResult<bool> {
        self.update_order(order_id, |o| {
            o.payment_method = Some(PAYMENT_METHOD_ONLINE.to_string());
            o.payment_status = Some(PaymentStatus::Pending.as_str().to_string());
            o.payment_id = Some(payment_id.to_string());
            o.payment_url = payment_url.map(String::from);
        })
    }

    async fn mark_paid(&self, order_id: i32) -> ShopResult<bool> {
        self.update_order(order_id, |o| {
            o.payment_status = Some(PaymentStatus::Paid.as_str().to_string());
            o.status = OrderStatus::Confirmed.as_str().to_string();
        })
    }

    async fn list_products(&self) -> ShopResult<Vec<Product>> {
        let tables = self.tables.lock().unwrap();
        let mut products: Vec<Product> = tables
            .products
            .iter()
            .cloned()
            .map(|mut p| {
                let category = tables
                    .categories
                    .iter()
                    .find(|c| Some(c.id) == p.category_id);
                p.category_name = category.map(|c| c.name.clone());
                p.category_slug = category.map(|c| c.slug.clone());
                p
            })
            .collect();
        products.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(products)
    }

    async fn list_categories(&self) -> ShopResult<Vec<Category>> {
        let mut categories = self.tables.lock().unwrap().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_product(&self, fields: &ProductFields) -> ShopResult<i32> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();

        tables.next_product_id += 1;
        let id = tables.next_product_id;
        tables.products.push(Product {
            id,
            name: fields.name.clone(),
            description: fields.description.clone(),
            price: fields.price,
            category_id: fields.category_id,
            image_url: fields.image_url.clone(),
            is_available: fields.is_available,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            category_name: None,
            category_slug: None,
        });

        Ok(id)
    }

    async fn update_product(&self, product_id: i32, fields: &ProductFields) -> ShopResult<bool> {
        self.check_writable()?;
        let mut tables = self.tables.lock().unwrap();

        match tables.products.iter_mut().find(|p| p.id == product_id) {
            Some(product) => {
                product.name = fields.name.clone();
                product.description = fields.description.clone();
                product.price = fields.price;
                product.category_id = fields.category_id;
                product.image_url = fields.image_url.clone();
                product.is_available = fields.is_available;
                product.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// =============================================================================
// Gateway
// =============================================================================

#[derive(Default)]
struct Script {
    created: Vec<PaymentRequest>,
    payments: HashMap<String, GatewayPayment>,
    reject: Option<(u16, String)>,
    next_id: u32,
}

/// Gateway that records requests and answers from a script
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<Script>,
}

impl ScriptedGateway {
    /// Every payment creation request seen so far
    pub fn created(&self) -> Vec<PaymentRequest> {
        self.script.lock().unwrap().created.clone()
    }

    /// Answer the next creations with this status and body
    pub fn reject_with(&self, status: u16, body: &str) {
        self.script.lock().unwrap().reject = Some((status, body.to_string()));
    }

    /// Flip a payment to `succeeded`
    pub fn succeed(&self, payment_id: &str) {
        if let Some(payment) = self.script.lock().unwrap().payments.get_mut(payment_id) {
            payment.status = GatewayPaymentStatus::Succeeded;
            payment.paid = true;
        }
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> ShopResult<GatewayPayment> {
        let mut script = self.script.lock().unwrap();
        script.created.push(request.clone());

        if let Some((status, body)) = script.reject.clone() {
            return Err(ShopError::Upstream { status, body });
        }

        script.next_id += 1;
        let id = format!("pay-{}", script.next_id);

        // The gateway echoes amounts with kopeck precision
        let value = Decimal::from_str(&request.amount.minor_precision_string())
            .map_err(|e| ShopError::Internal(e.to_string()))?;

        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "order_id".to_string(),
            serde_json::Value::String(request.order_id.to_string()),
        );

        let payment = GatewayPayment {
            id: id.clone(),
            status: GatewayPaymentStatus::Pending,
            paid: false,
            amount: Some(Money::new(value, request.amount.currency)),
            confirmation_url: Some(format!("https://pay.example.com/{}", id)),
            metadata,
        };
        script.payments.insert(id, payment.clone());

        Ok(payment)
    }

    async fn get_payment(&self, payment_id: &str) -> ShopResult<GatewayPayment> {
        self.script
            .lock()
            .unwrap()
            .payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| ShopError::Upstream {
                status: 404,
                body: r#"{"type":"error","code":"not_found"}"#.to_string(),
            })
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Notifier that hands every notification to a channel
pub struct RecordingNotifier {
    sent: mpsc::UnboundedSender<OrderNotification>,
    fail: AtomicBool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_new_order(&self, notification: &OrderNotification) -> ShopResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ShopError::Network("SMTP relay unreachable".to_string()));
        }
        let _ = self.sent.send(notification.clone());
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Router plus handles on every double behind it
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
    notifier: Arc<RecordingNotifier>,
    notifications: mpsc::UnboundedReceiver<OrderNotification>,
    gateway_enabled: bool,
    config: AppConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        let (sent, notifications) = mpsc::unbounded_channel();

        Self {
            store: Arc::new(MemoryStore::seeded()),
            gateway: Arc::new(ScriptedGateway::default()),
            notifier: Arc::new(RecordingNotifier {
                sent,
                fail: AtomicBool::new(false),
            }),
            notifications,
            gateway_enabled: true,
            config: AppConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
                database_url: "postgres://unused".to_string(),
                database_max_connections: 1,
                admin_token: None,
                payment_return_url: "http://localhost:8080".to_string(),
            },
        }
    }

    pub fn with_failing_notifier(self) -> Self {
        self.notifier.fail.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.config.admin_token = Some(token.to_string());
        self
    }

    pub fn without_gateway(mut self) -> Self {
        self.gateway_enabled = false;
        self
    }

    pub fn state(&self) -> AppState {
        let gateway = self
            .gateway_enabled
            .then(|| self.gateway.clone() as BoxedPaymentGateway);

        AppState::new(
            self.store.clone() as BoxedOrderStore,
            gateway,
            self.notifier.clone() as BoxedNotifier,
            self.config.clone(),
        )
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(create_router(self.state())).unwrap()
    }

    /// Wait briefly for the spawned notification task
    pub async fn next_notification(&mut self) -> Option<OrderNotification> {
        tokio::time::timeout(Duration::from_secs(2), self.notifications.recv())
            .await
            .ok()
            .flatten()
    }
}
