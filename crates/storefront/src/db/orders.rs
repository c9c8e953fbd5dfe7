//! Order repository for database operations.
//!
//! The reconciler's write is a single atomic upsert keyed by the provider's
//! checkout session id, so concurrent deliveries of the same event cannot
//! create two rows: one connection inserts, the other lands on the conflict
//! arm and only touches the mutable fields.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cedarloom_core::{OrderId, UserId};

use super::RepositoryError;
use crate::models::order::Order;

#[derive(Debug, sqlx::FromRow)]
struct UpsertedOrderRow {
    id: Uuid,
    provider_session_id: String,
    amount: i64,
    status: String,
    user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    // xmax = 0 on freshly inserted rows; nonzero when the conflict arm ran.
    created: bool,
}

fn to_order(row: &UpsertedOrderRow) -> Order {
    Order {
        id: OrderId::new(row.id),
        provider_session_id: row.provider_session_id.clone(),
        amount: row.amount,
        status: row.status.clone(),
        user_id: row.user_id.map(UserId::new),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent upsert keyed by `provider_session_id`.
    ///
    /// The first delivery inserts the row and assigns its id and
    /// `created_at`; every later delivery only updates amount, status,
    /// user and `updated_at`. Returns the stored order and whether this call
    /// created it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_provider_session(
        &self,
        provider_session_id: &str,
        amount: i64,
        status: &str,
        user_id: Option<UserId>,
    ) -> Result<(Order, bool), RepositoryError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, UpsertedOrderRow>(
            r"
            INSERT INTO orders (id, provider_session_id, amount, status, user_id,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (provider_session_id) DO UPDATE
            SET amount = EXCLUDED.amount,
                status = EXCLUDED.status,
                user_id = EXCLUDED.user_id,
                updated_at = EXCLUDED.updated_at
            RETURNING id, provider_session_id, amount, status, user_id,
                      created_at, updated_at, (xmax = 0) AS created
            ",
        )
        .bind(OrderId::generate().as_uuid())
        .bind(provider_session_id)
        .bind(amount)
        .bind(status)
        .bind(user_id.map(|id| id.as_uuid()))
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok((to_order(&row), row.created))
    }

    /// Get an order by its provider session id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_provider_session(
        &self,
        provider_session_id: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        #[derive(Debug, sqlx::FromRow)]
        struct OrderRow {
            id: Uuid,
            provider_session_id: String,
            amount: i64,
            status: String,
            user_id: Option<Uuid>,
            created_at: DateTime<Utc>,
            updated_at: DateTime<Utc>,
        }

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, provider_session_id, amount, status, user_id,
                   created_at, updated_at
            FROM orders
            WHERE provider_session_id = $1
            ",
        )
        .bind(provider_session_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| Order {
            id: OrderId::new(r.id),
            provider_session_id: r.provider_session_id,
            amount: r.amount,
            status: r.status,
            user_id: r.user_id.map(UserId::new),
            created_at: r.created_at,
            updated_at: r.updated_at,
        }))
    }
}
