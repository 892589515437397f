//! # Postgres Order Store
//!
//! `OrderStore` over a `sqlx` connection pool. Order intake runs in a
//! transaction; everything else is a single statement.

use async_trait::async_trait;
use bakery_core::{
    Category, NewOrder, Order, OrderItem, OrderLookup, OrderStatus, OrderStore, PaymentStatus,
    Product, ProductFields, ShopError, ShopResult, PAYMENT_METHOD_ONLINE,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

const ORDER_COLUMNS: &str = "SELECT id, customer_name, customer_phone, customer_email, \
     delivery_method, delivery_address, comments, total_amount, status, payment_method, \
     payment_status, payment_id, payment_url, created_at, updated_at FROM orders";

const PRODUCT_COLUMNS: &str = "SELECT p.id, p.name, p.description, p.price, p.category_id, \
     p.image_url, p.is_available, p.created_at, p.updated_at, \
     c.name AS category_name, c.slug AS category_slug \
     FROM products p LEFT JOIN categories c ON c.id = p.category_id";

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i32,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    delivery_method: String,
    delivery_address: Option<String>,
    comments: Option<String>,
    total_amount: Decimal,
    status: String,
    payment_method: Option<String>,
    payment_status: Option<String>,
    payment_id: Option<String>,
    payment_url: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
            delivery_method: self.delivery_method,
            delivery_address: self.delivery_address,
            comments: self.comments,
            total_amount: self.total_amount,
            status: self.status,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            payment_id: self.payment_id,
            payment_url: self.payment_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: Option<i32>,
    product_name: String,
    product_price: Decimal,
    quantity: i32,
    subtotal: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            product_price: row.product_price,
            quantity: row.quantity,
            subtotal: row.subtotal,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: Option<String>,
    price: Decimal,
    category_id: Option<i32>,
    image_url: Option<String>,
    is_available: bool,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category_id: row.category_id,
            image_url: row.image_url,
            is_available: row.is_available,
            created_at: row.created_at,
            updated_at: row.updated_at,
            category_name: row.category_name,
            category_slug: row.category_slug,
        }
    }
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    created_at: Option<DateTime<Utc>>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
        }
    }
}

/// Map driver errors; broken references are the caller's fault
fn storage_error(err: sqlx::Error) -> ShopError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_foreign_key_violation() {
            return ShopError::Validation(format!("referenced row does not exist: {}", db.message()));
        }
    }
    ShopError::Storage(err.to_string())
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a bounded pool
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch items for a page of orders in one query and attach them
    async fn with_items(&self, rows: Vec<OrderRow>) -> ShopResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let items: Vec<OrderItemRow> = sqlx::query_as(
            "SELECT id, order_id, product_id, product_name, product_price, quantity, subtotal \
             FROM order_items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let mut by_order: HashMap<i32, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    #[instrument(skip(self, order), fields(items = order.items.len()))]
    async fn create_order(&self, order: &NewOrder) -> ShopResult<i32> {
        // Rolls back on drop if any insert fails
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let (order_id,): (i32,) = sqlx::query_as(
            "INSERT INTO orders (customer_name, customer_phone, customer_email, \
             delivery_method, delivery_address, comments, total_amount, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
        )
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.customer_email)
        .bind(order.delivery_method.as_str())
        .bind(&order.delivery_address)
        .bind(&order.comments)
        .bind(order.total_amount)
        .bind(OrderStatus::New.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        for item in &order.items {
            let quantity = i32::try_from(item.quantity)
                .map_err(|_| ShopError::Validation("quantity out of range".to_string()))?;

            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, product_name, product_price, \
                 quantity, subtotal) VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.product_price)
            .bind(quantity)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)?;
        debug!(order_id, "Order transaction committed");

        Ok(order_id)
    }

    async fn find_orders(&self, lookup: &OrderLookup) -> ShopResult<Vec<Order>> {
        let mut query = QueryBuilder::<Postgres>::new(ORDER_COLUMNS);
        match lookup {
            OrderLookup::Id(id) => query.push(" WHERE id = ").push_bind(*id),
            OrderLookup::Phone(phone) => query.push(" WHERE customer_phone = ").push_bind(phone),
            OrderLookup::Email(email) => query.push(" WHERE customer_email = ").push_bind(email),
        };
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows: Vec<OrderRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        self.with_items(rows).await
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> ShopResult<Vec<Order>> {
        let mut query = QueryBuilder::<Postgres>::new(ORDER_COLUMNS);
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status.as_str());
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows: Vec<OrderRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)?;

        self.with_items(rows).await
    }

    async fn update_order_status(&self, order_id: i32, status: OrderStatus) -> ShopResult<bool> {
        let result =
            sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(status.as_str())
                .bind(order_id)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn attach_payment(
        &self,
        order_id: i32,
        payment_id: &str,
        payment_url: Option<&str>,
    ) -> ShopResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET payment_method = $1, payment_status = $2, payment_id = $3, \
             payment_url = $4, updated_at = NOW() WHERE id = $5",
        )
        .bind(PAYMENT_METHOD_ONLINE)
        .bind(PaymentStatus::Pending.as_str())
        .bind(payment_id)
        .bind(payment_url)
        .bind(order_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_paid(&self, order_id: i32) -> ShopResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = $1, status = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(PaymentStatus::Paid.as_str())
        .bind(OrderStatus::Confirmed.as_str())
        .bind(order_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self) -> ShopResult<Vec<Product>> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("{} ORDER BY p.created_at DESC, p.id DESC", PRODUCT_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_categories(&self) -> ShopResult<Vec<Category>> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name, slug, created_at FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn create_product(&self, fields: &ProductFields) -> ShopResult<i32> {
        let (id,): (i32,) = sqlx::query_as(
            "INSERT INTO products (name, description, price, category_id, image_url, is_available) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.category_id)
        .bind(&fields.image_url)
        .bind(fields.is_available)
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(id)
    }

    async fn update_product(&self, product_id: i32, fields: &ProductFields) -> ShopResult<bool> {
        let result = sqlx::query(
            "UPDATE products SET name = $1, description = $2, price = $3, category_id = $4, \
             image_url = $5, is_available = $6, updated_at = NOW() WHERE id = $7",
        )
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price)
        .bind(fields.category_id)
        .bind(&fields.image_url)
        .bind(fields.is_available)
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(result.rows_affected() > 0)
    }
}
