//! Cart domain types and merge semantics.
//!
//! A cart is a per-user document of line items. The merge rules live here as
//! pure functions on [`Cart`] so they can be exercised without a store; the
//! repository layer is responsible for writing the document back atomically.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cedarloom_core::{ProductId, UserId};

use super::product::ProductSnapshot;

/// One line in a cart: a product snapshot plus a quantity.
///
/// Line ids are unique within a cart - adding an already-present product
/// increments `quantity` instead of appending a duplicate line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price in standard currency units, captured at add-time.
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
}

/// A user's cart.
#[derive(Debug, Clone)]
pub struct Cart {
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// An empty cart for the given user.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Merge a product snapshot into the cart: increment the matching line's
    /// quantity by one, or append a new line with quantity 1.
    pub fn add_snapshot(&mut self, snapshot: ProductSnapshot) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == snapshot.id) {
            item.quantity = item.quantity.saturating_add(1);
        } else {
            self.items.push(CartItem {
                id: snapshot.id,
                name: snapshot.name,
                price: snapshot.price,
                image: snapshot.image,
                quantity: 1,
            });
        }
    }

    /// Remove the line with the given product id. Removing a line that is not
    /// present is a no-op.
    pub fn remove_item(&mut self, product_id: ProductId) {
        self.items.retain(|item| item.id != product_id);
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
