//! Product domain types.
//!
//! The catalog itself is managed out of band (CLI seeding); the storefront
//! core only reads products to snapshot them into carts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cedarloom_core::{ProductId, ProductStatus};

/// A catalog product.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub status: ProductStatus,
    /// Price in standard currency units (e.g. dollars).
    pub price: Decimal,
    pub images: Vec<String>,
    pub category: String,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

/// The slice of a product captured into a cart line at add-time.
///
/// Prices are snapshotted here and never re-read from the catalog, so later
/// catalog changes do not alter existing carts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.images.first().cloned().unwrap_or_default(),
        }
    }
}
