//! Order domain types.

use chrono::{DateTime, Utc};

use cedarloom_core::{OrderId, UserId};

/// A payment-confirmed order.
///
/// Keyed one-to-one to a provider checkout session: `provider_session_id` is
/// the idempotency key under which the reconciler upserts, so repeated
/// webhook deliveries update this row rather than creating another.
#[derive(Debug, Clone)]
pub struct Order {
    /// Order id, assigned exactly once when the row is first created.
    pub id: OrderId,
    /// Provider checkout session id (unique).
    pub provider_session_id: String,
    /// Total amount in minor currency units (cents).
    pub amount: i64,
    /// Payment status as reported by the provider (e.g. "paid").
    pub status: String,
    /// Owning user, if the checkout carried one (guest checkouts have none).
    pub user_id: Option<UserId>,
    /// Set on first creation, never touched by later deliveries.
    pub created_at: DateTime<Utc>,
    /// Bumped on every delivery.
    pub updated_at: DateTime<Utc>,
}
