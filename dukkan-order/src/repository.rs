use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::models::{NewOrder, Order, OrderItem, OrderStatus};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Persistent order ledger.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert an order with its items. Idempotent on `order_id`: if a row
    /// with that id already exists nothing is written and `Ok(false)` is
    /// returned. Backed by a unique constraint, so concurrent finalize
    /// triggers cannot both insert.
    async fn insert_order(&self, order: &NewOrder) -> Result<bool, BoxError>;

    async fn get_by_order_id(&self, order_id: &str) -> Result<Option<Order>, BoxError>;

    /// Update status by human-readable order id. Returns `false` when no
    /// such order exists.
    async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<bool, BoxError>;

    /// Recent orders for a customer email, newest first.
    async fn list_for_email(&self, email: &str) -> Result<Vec<Order>, BoxError>;
}

/// In-memory ledger used by tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryOrderLedger {
    orders: Mutex<BTreeMap<String, Order>>,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderLedger {
    async fn insert_order(&self, order: &NewOrder) -> Result<bool, BoxError> {
        let mut orders = self.orders.lock().unwrap();
        if orders.contains_key(&order.order_id) {
            return Ok(false);
        }
        let id = Uuid::new_v4();
        let items = order
            .items
            .iter()
            .map(|item| OrderItem {
                id: Uuid::new_v4(),
                order_ref: id,
                product_name: item.product_name.clone(),
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();
        orders.insert(
            order.order_id.clone(),
            Order {
                id,
                order_id: order.order_id.clone(),
                customer_name: order.customer_name.clone(),
                customer_email: dukkan_shared::Masked::new(order.customer_email.clone()),
                customer_phone: dukkan_shared::Masked::new(order.customer_phone.clone()),
                address: order.address.clone(),
                city: order.city.clone(),
                postal_code: order.postal_code.clone(),
                total_amount: order.total_amount,
                delivery_fee: order.delivery_fee,
                payment_method: order.payment_method.clone(),
                status: OrderStatus::Pending,
                order_date: chrono::Utc::now(),
                items,
            },
        );
        Ok(true)
    }

    async fn get_by_order_id(&self, order_id: &str) -> Result<Option<Order>, BoxError> {
        Ok(self.orders.lock().unwrap().get(order_id).cloned())
    }

    async fn update_status(&self, order_id: &str, status: OrderStatus) -> Result<bool, BoxError> {
        let mut orders = self.orders.lock().unwrap();
        match orders.get_mut(order_id) {
            Some(order) => {
                order.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_email(&self, email: &str) -> Result<Vec<Order>, BoxError> {
        let orders = self.orders.lock().unwrap();
        let mut found: Vec<Order> = orders
            .values()
            .filter(|o| o.customer_email.inner() == email)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(found)
    }
}
