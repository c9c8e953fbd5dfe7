//! Cart repository for database operations.
//!
//! The cart is stored as one jsonb document per user plus a `version`
//! counter. Writers read the document, apply the merge in memory, and write
//! back with the version they read; a concurrent writer bumps the version
//! first and the stale write affects zero rows, signalling the service layer
//! to re-read and retry. This closes the lost-update window a plain
//! read-modify-write would have.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use cedarloom_core::UserId;

use super::RepositoryError;
use crate::models::cart::{Cart, CartItem};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    user_id: Uuid,
    items: Json<Vec<CartItem>>,
    version: i32,
    updated_at: DateTime<Utc>,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart together with its current version.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<(Cart, i32)>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT user_id, items, version, updated_at
            FROM carts
            WHERE user_id = $1
            ",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                Cart {
                    user_id: UserId::new(r.user_id),
                    items: r.items.0,
                    updated_at: r.updated_at,
                },
                r.version,
            )
        }))
    }

    /// Insert a fresh cart document at version 1.
    ///
    /// Returns `false` without writing if a cart already exists for the user
    /// (a concurrent writer created one first); the caller should re-read and
    /// retry as an update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn try_insert(
        &self,
        user_id: UserId,
        items: &[CartItem],
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO carts (user_id, items, version, updated_at)
            VALUES ($1, $2, 1, now())
            ON CONFLICT (user_id) DO NOTHING
            ",
        )
        .bind(user_id.as_uuid())
        .bind(Json(items))
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the cart document, guarded by the version the caller read.
    ///
    /// Returns `false` without writing if the stored version no longer
    /// matches (or the row is gone); the caller should re-read and retry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn try_update(
        &self,
        user_id: UserId,
        items: &[CartItem],
        expected_version: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE carts
            SET items = $2, version = version + 1, updated_at = now()
            WHERE user_id = $1 AND version = $3
            ",
        )
        .bind(user_id.as_uuid())
        .bind(Json(items))
        .bind(expected_version)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a user's cart row entirely. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM carts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
