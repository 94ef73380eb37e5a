use dukkan_catalog::LineItemKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session-scoped shopping cart: line-item key to quantity.
///
/// Entries are never validated against the catalog at write time; a key may
/// point at a product that has since been deleted. Pricing skips such lines.
/// Quantities are always positive: setting a quantity to zero removes the
/// entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    entries: BTreeMap<LineItemKey, u32>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `qty` units of an item, on top of whatever is already there.
    pub fn add(&mut self, key: LineItemKey, qty: u32) {
        if qty == 0 {
            return;
        }
        *self.entries.entry(key).or_insert(0) += qty;
    }

    /// Overwrite the quantity for an item. Zero removes the entry.
    pub fn set_quantity(&mut self, key: LineItemKey, qty: u32) {
        if qty == 0 {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, qty);
        }
    }

    pub fn remove(&mut self, key: &LineItemKey) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total units across all lines, for the cart badge.
    pub fn total_quantity(&self) -> u32 {
        self.entries.values().sum()
    }

    pub fn snapshot(&self) -> impl Iterator<Item = (&LineItemKey, u32)> {
        self.entries.iter().map(|(k, q)| (k, *q))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(id: i64) -> LineItemKey {
        LineItemKey::Simple(id)
    }

    #[test]
    fn test_add_increments_existing_entry() {
        let mut cart = Cart::new();
        cart.add(simple(1), 1);
        cart.add(simple(1), 2);
        assert_eq!(cart.snapshot().collect::<Vec<_>>(), vec![(&simple(1), 3)]);
    }

    #[test]
    fn test_set_quantity_overwrites() {
        let mut cart = Cart::new();
        cart.add(simple(1), 5);
        cart.set_quantity(simple(1), 2);
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_zero_quantity_removes_entry() {
        let mut cart = Cart::new();
        cart.add(simple(1), 3);
        cart.set_quantity(simple(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_is_a_no_op() {
        let mut cart = Cart::new();
        cart.add(simple(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(simple(1), 1);
        cart.add(
            LineItemKey::Variant {
                variant_id: 4,
                size_id: 7,
            },
            2,
        );
        cart.remove(&simple(1));
        assert_eq!(cart.len(), 1);
        cart.clear();
        assert!(cart.is_empty());
    }

    /// The cart never exposes a non-positive quantity, whatever sequence of
    /// operations produced it.
    #[test]
    fn test_no_non_positive_quantities_survive() {
        let mut cart = Cart::new();
        let keys = [simple(1), simple(2), simple(3)];
        let ops: [(usize, u32); 9] = [
            (0, 1),
            (1, 0),
            (0, 0),
            (2, 4),
            (1, 2),
            (2, 0),
            (0, 7),
            (1, 0),
            (2, 1),
        ];
        for (i, (key_idx, qty)) in ops.iter().enumerate() {
            if i % 2 == 0 {
                cart.add(keys[*key_idx], *qty);
            } else {
                cart.set_quantity(keys[*key_idx], *qty);
            }
            assert!(cart.snapshot().all(|(_, q)| q > 0));
        }
    }

    #[test]
    fn test_round_trips_through_json() {
        let mut cart = Cart::new();
        cart.add(simple(12), 2);
        cart.add(
            LineItemKey::Variant {
                variant_id: 4,
                size_id: 7,
            },
            1,
        );
        let json = serde_json::to_string(&cart).unwrap();
        let back: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }
}
