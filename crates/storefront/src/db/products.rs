//! Product repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use cedarloom_core::{ProductId, ProductStatus};

use super::RepositoryError;
use crate::models::product::Product;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    status: String,
    price: Decimal,
    images: Vec<String>,
    category: String,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

fn to_product(row: ProductRow) -> Result<Product, RepositoryError> {
    let status = ProductStatus::from_str_opt(&row.status).ok_or_else(|| {
        RepositoryError::DataCorruption(format!("unknown product status: {}", row.status))
    })?;

    Ok(Product {
        id: ProductId::new(row.id),
        name: row.name,
        description: row.description,
        status,
        price: row.price,
        images: row.images,
        category: row.category,
        is_featured: row.is_featured,
        created_at: row.created_at,
    })
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored status is unknown.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, name, description, status, price, images, category,
                   is_featured, created_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(to_product).transpose()
    }

    /// Insert a catalog row (used by the CLI seed command).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (id, name, description, status, price, images,
                                  category, is_featured, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.status.as_str())
        .bind(product.price)
        .bind(&product.images)
        .bind(&product.category)
        .bind(product.is_featured)
        .bind(product.created_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("product already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(())
    }
}
