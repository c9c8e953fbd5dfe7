//! Session repository for database operations.
//!
//! Sessions are single rows keyed by the opaque token. Expiry is enforced at
//! read time by the auth service, which deletes a row it finds expired; there
//! is no background sweep.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cedarloom_core::UserId;

use super::RepositoryError;
use crate::models::session::Session;

#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    token: String,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Repository for session database operations.
pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new session row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (a token
    /// collision would surface here as a unique violation; with 256-bit
    /// tokens that is not an expected path).
    pub async fn create(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(token)
        .bind(user_id.as_uuid())
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Look up a session by token. Does not interpret expiry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, token: &str) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT token, user_id, expires_at
            FROM sessions
            WHERE token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| Session {
            token: r.token,
            user_id: UserId::new(r.user_id),
            expires_at: r.expires_at,
        }))
    }

    /// Delete a session row if present.
    ///
    /// Idempotent: deleting an absent token reports `false`, not an error
    /// (the expiry check-then-delete race resolves here as a harmless no-op).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, token: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
