use dukkan_catalog::{resolve_line, CatalogRepository, LineItemKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::Cart;

/// Delivery fee rule: a flat fee below the free-delivery threshold, nothing
/// at or above it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    pub fee: Decimal,
    pub free_threshold: Decimal,
}

impl DeliveryPolicy {
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal < self.free_threshold {
            self.fee
        } else {
            Decimal::ZERO
        }
    }
}

/// A cart entry resolved against the catalog at checkout time. Read-only
/// projection; never persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineItemSnapshot {
    pub key: LineItemKey,
    pub product_id: i64,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Fully priced view of a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedCart {
    pub lines: Vec<LineItemSnapshot>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
    pub currency: String,
}

impl PricedCart {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Resolve and price every cart line.
///
/// Lines whose key no longer resolves (deleted product, detached size) are
/// skipped; the totals reflect only the lines that made it through. Catalog
/// inconsistency is never fatal to the whole cart.
pub async fn price_cart(
    catalog: &dyn CatalogRepository,
    cart: &Cart,
    delivery: &DeliveryPolicy,
    currency: &str,
) -> Result<PricedCart, Box<dyn std::error::Error + Send + Sync>> {
    let mut lines = Vec::with_capacity(cart.len());
    let mut subtotal = Decimal::ZERO;

    for (key, quantity) in cart.snapshot() {
        match resolve_line(catalog, key).await? {
            Some(resolved) => {
                let line_total = resolved.unit_price * Decimal::from(quantity);
                subtotal += line_total;
                lines.push(LineItemSnapshot {
                    key: *key,
                    product_id: resolved.product_id,
                    name: resolved.name,
                    unit_price: resolved.unit_price,
                    quantity,
                    line_total,
                });
            }
            None => {
                tracing::debug!(key = %key, "skipping unresolvable cart line");
            }
        }
    }

    let delivery_fee = if lines.is_empty() {
        Decimal::ZERO
    } else {
        delivery.fee_for(subtotal)
    };

    Ok(PricedCart {
        lines,
        subtotal,
        delivery_fee,
        total: subtotal + delivery_fee,
        currency: currency.to_string(),
    })
}
