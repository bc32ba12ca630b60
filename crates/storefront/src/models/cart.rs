//! The session-resident shopping cart.
//!
//! A cart is a mapping from product-id *string* to a positive quantity,
//! serialized as JSON into the session. Keys are strings because that is
//! what the session store can round-trip as object keys; every read-side
//! consumer resolves them against the products table and silently skips
//! entries whose product has since been deleted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use soko_core::ProductId;

/// A shopping cart: product-id string → quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: BTreeMap<String, u32>,
}

impl Cart {
    /// Add one unit of a product (starting from zero if absent).
    pub fn add(&mut self, id: ProductId) {
        let quantity = self.items.entry(id.to_string()).or_insert(0);
        *quantity = quantity.saturating_add(1);
    }

    /// Remove an entry entirely.
    ///
    /// Returns `true` if the key was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.items.remove(key).is_some()
    }

    /// Set the quantity of an existing entry exactly (not additive).
    pub fn set_quantity(&mut self, key: &str, quantity: u32) {
        if let Some(existing) = self.items.get_mut(key) {
            *existing = quantity;
        }
    }

    /// Whether the cart holds an entry for this key.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Quantity for a key, if present.
    #[must_use]
    pub fn quantity(&self, key: &str) -> Option<u32> {
        self.items.get(key).copied()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all entries (the nav badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.values().fold(0, |acc, q| acc.saturating_add(*q))
    }

    /// Iterate over `(product-id string, quantity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(k, q)| (k.as_str(), *q))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_twice_accumulates() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(7));
        cart.add(ProductId::new(7));
        assert_eq!(cart.quantity("7"), Some(2));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_remove_yields_empty_cart() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(7));
        assert!(cart.remove("7"));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_key_reports_false() {
        let mut cart = Cart::default();
        assert!(!cart.remove("9"));
    }

    #[test]
    fn test_set_quantity_is_exact_not_additive() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(3));
        cart.set_quantity("3", 5);
        assert_eq!(cart.quantity("3"), Some(5));
    }

    #[test]
    fn test_set_quantity_ignores_absent_key() {
        let mut cart = Cart::default();
        cart.set_quantity("3", 5);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(1));
        cart.add(ProductId::new(2));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut cart = Cart::default();
        cart.add(ProductId::new(4));
        cart.add(ProductId::new(4));

        let json = serde_json::to_string(&cart).unwrap();
        assert_eq!(json, r#"{"4":2}"#);

        let parsed: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cart);
    }
}
