use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use dukkan_order::{NewOrder, Order, OrderItem, OrderRepository, OrderStatus};
use dukkan_shared::Masked;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub struct PgOrderLedger {
    pool: PgPool,
}

impl PgOrderLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_id: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    address: String,
    city: String,
    postal_code: String,
    total_amount: Decimal,
    delivery_fee: Decimal,
    payment_method: String,
    status: String,
    order_date: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_ref: Uuid,
    product_name: String,
    product_id: Option<i64>,
    quantity: i32,
    price: Decimal,
}

const ORDER_COLUMNS: &str = "id, order_id, customer_name, customer_email, customer_phone, \
     address, city, postal_code, total_amount, delivery_fee, payment_method, status, order_date";

impl PgOrderLedger {
    async fn load_items(&self, order_ref: Uuid) -> Result<Vec<OrderItem>, BoxError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, order_ref, product_name, product_id, quantity, price \
             FROM order_items WHERE order_ref = $1 ORDER BY id",
        )
        .bind(order_ref)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| OrderItem {
                id: r.id,
                order_ref: r.order_ref,
                product_name: r.product_name,
                product_id: r.product_id,
                quantity: r.quantity.max(0) as u32,
                price: r.price,
            })
            .collect())
    }

    async fn assemble(&self, row: OrderRow) -> Result<Order, BoxError> {
        let items = self.load_items(row.id).await?;
        Ok(Order {
            id: row.id,
            order_id: row.order_id,
            customer_name: row.customer_name,
            customer_email: Masked::new(row.customer_email),
            customer_phone: Masked::new(row.customer_phone),
            address: row.address,
            city: row.city,
            postal_code: row.postal_code,
            total_amount: row.total_amount,
            delivery_fee: row.delivery_fee,
            payment_method: row.payment_method,
            status: OrderStatus::parse(&row.status).unwrap_or(OrderStatus::Pending),
            order_date: row.order_date,
            items,
        })
    }
}

#[async_trait]
impl OrderRepository for PgOrderLedger {
    async fn insert_order(&self, order: &NewOrder) -> Result<bool, BoxError> {
        let mut tx = self.pool.begin().await?;

        let id = Uuid::new_v4();
        // The unique constraint on order_id makes this the race-safe
        // idempotency point: concurrent finalize triggers both reach it,
        // exactly one inserts.
        let result = sqlx::query(
            "INSERT INTO orders \
             (id, order_id, customer_name, customer_email, customer_phone, \
              address, city, postal_code, total_amount, delivery_fee, \
              payment_method, status, order_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW()) \
             ON CONFLICT (order_id) DO NOTHING",
        )
        .bind(id)
        .bind(&order.order_id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.customer_phone)
        .bind(&order.address)
        .bind(&order.city)
        .bind(&order.postal_code)
        .bind(order.total_amount)
        .bind(order.delivery_fee)
        .bind(&order.payment_method)
        .bind(OrderStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items (id, order_ref, product_name, product_id, quantity, price) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(&item.product_name)
            .bind(item.product_id)
            .bind(item.quantity as i32)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn get_by_order_id(&self, order_id: &str) -> Result<Option<Order>, BoxError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE order_id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.assemble(row).await?)),
            None => Ok(None),
        }
    }

    async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<bool, BoxError> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE order_id = $2")
            .bind(status.as_str())
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for_email(&self, email: &str) -> Result<Vec<Order>, BoxError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE customer_email = $1 ORDER BY order_date DESC LIMIT 20",
            ORDER_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            orders.push(self.assemble(row).await?);
        }
        Ok(orders)
    }
}
