//! Seed catalog products from a YAML file.
//!
//! The file is read and validated before any database connection is opened,
//! so a malformed catalog never results in a partial seed.
//!
//! # File Format
//!
//! ```yaml
//! products:
//!   - name: Court Runner
//!     description: Everyday low-top runner.
//!     status: published
//!     price: "89.00"
//!     images:
//!       - https://cdn.example.com/court-runner.jpg
//!     category: men
//!     is_featured: true
//! ```

use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;

use cedarloom_core::{ProductId, ProductStatus};
use cedarloom_storefront::db::products::ProductRepository;
use cedarloom_storefront::models::product::Product;

use super::migrate::database_url;

/// One product entry in the seed file.
#[derive(Debug, Deserialize)]
struct SeedProduct {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    status: ProductStatus,
    price: Decimal,
    #[serde(default)]
    images: Vec<String>,
    category: String,
    #[serde(default)]
    is_featured: bool,
}

/// Seed file root.
#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<SeedProduct>,
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an entry fails
/// validation, or a database operation fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let content = tokio::fs::read_to_string(file_path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    info!(products = seed.products.len(), "Parsed catalog file");

    // Validate before connecting
    for (i, entry) in seed.products.iter().enumerate() {
        if entry.name.is_empty() {
            return Err(format!("product {i}: name must not be empty").into());
        }
        if entry.price < Decimal::ZERO {
            return Err(format!("product {i} ({}): negative price", entry.name).into());
        }
        if entry.category.is_empty() {
            return Err(format!("product {i} ({}): missing category", entry.name).into());
        }
    }

    let database_url = database_url()?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;
    let repo = ProductRepository::new(&pool);

    let mut inserted = 0usize;
    for entry in seed.products {
        let product = Product {
            id: ProductId::generate(),
            name: entry.name,
            description: entry.description,
            status: entry.status,
            price: entry.price,
            images: entry.images,
            category: entry.category,
            is_featured: entry.is_featured,
            created_at: Utc::now(),
        };

        repo.insert(&product).await?;
        inserted += 1;
    }

    info!(inserted, "Catalog seed complete");
    Ok(())
}
