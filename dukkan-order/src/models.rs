use chrono::{DateTime, Utc};
use dukkan_shared::Masked;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order status in the ledger lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Paid,
    Failed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Whether a transition to `next` is allowed. Orders only move forward:
    /// a failed or cancelled order stays that way, delivery is final.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Paid, Shipped)
                | (Shipped, Delivered)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "PAID" => Some(OrderStatus::Paid),
            "FAILED" => Some(OrderStatus::Failed),
            "SHIPPED" => Some(OrderStatus::Shipped),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

/// A placed order as stored in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Human-readable identifier, unique across the ledger. This is what the
    /// payment provider sees as the client reference.
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: Masked<String>,
    pub customer_phone: Masked<String>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub total_amount: Decimal,
    pub delivery_fee: Decimal,
    pub payment_method: String,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One line of an order. Name and price are snapshots taken at order
/// creation so later catalog edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_ref: Uuid,
    pub product_name: String,
    pub product_id: Option<i64>,
    pub quantity: u32,
    pub price: Decimal,
}

/// Payload for inserting a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub total_amount: Decimal,
    pub delivery_fee: Decimal,
    pub payment_method: String,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_name: String,
    pub product_id: Option<i64>,
    pub quantity: u32,
    pub price: Decimal,
}

impl NewOrder {
    /// Sum of line totals plus the delivery fee. Must equal `total_amount`;
    /// downstream reporting assumes it.
    pub fn items_total(&self) -> Decimal {
        let lines: Decimal = self
            .items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum();
        lines + self.delivery_fee
    }
}

const ORDER_ID_PREFIX: &str = "THW";
const ORDER_ID_SUFFIX_LEN: usize = 8;

/// Mint a fresh human-readable order id, e.g. `THW7G2KX9QD`.
pub fn mint_order_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ORDER_ID_SUFFIX_LEN)
        .map(|_| {
            const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
            CHARSET[rng.gen_range(0..CHARSET.len())] as char
        })
        .collect();
    format!("{}{}", ORDER_ID_PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_shape() {
        let id = mint_order_id();
        assert_eq!(id.len(), 11);
        assert!(id.starts_with("THW"));
        assert!(id[3..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_status_transitions() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Paid.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Paid.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Paid));
        assert!(!Delivered.can_transition_to(Shipped));
        assert!(!Cancelled.can_transition_to(Paid));
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Failed,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(OrderStatus::parse("REFUNDED"), None);
    }

    #[test]
    fn test_items_total_includes_delivery_fee() {
        let order = NewOrder {
            order_id: "THWTEST0001".to_string(),
            customer_name: "Guest".to_string(),
            customer_email: "guest@example.com".to_string(),
            customer_phone: "+96800000000".to_string(),
            address: String::new(),
            city: String::new(),
            postal_code: String::new(),
            total_amount: Decimal::new(700, 2),
            delivery_fee: Decimal::new(200, 2),
            payment_method: "Thawani Pay".to_string(),
            items: vec![
                NewOrderItem {
                    product_name: "Desk Lamp".to_string(),
                    product_id: Some(1),
                    quantity: 1,
                    price: Decimal::new(300, 2),
                },
                NewOrderItem {
                    product_name: "Mug".to_string(),
                    product_id: Some(2),
                    quantity: 1,
                    price: Decimal::new(200, 2),
                },
            ],
        };
        assert_eq!(order.items_total(), order.total_amount);
    }
}
