//! Order reconciliation service.
//!
//! Applies payment confirmations - delivered by webhook, possibly more than
//! once and possibly concurrently - to durable orders, exactly once per
//! provider session. Payment confirmation is also the single trigger for
//! clearing the originating cart.

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, instrument};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::orders::OrderRepository;
use crate::stripe::types::CheckoutSessionObject;
use crate::stripe::{StripeClient, StripeError};

/// Errors that can occur during order reconciliation.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Payment provider failure (finalize path only).
    #[error("payment provider error: {0}")]
    Provider(#[from] StripeError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Order reconciliation service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    carts: CartRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            carts: CartRepository::new(pool),
        }
    }

    /// Record a completed checkout session.
    ///
    /// Idempotent upsert keyed by the provider session id: the first delivery
    /// creates the order (assigning its id and creation timestamp), later
    /// deliveries only refresh amount, status and the update timestamp. On
    /// the creating transition, when the session carries a user id, that
    /// user's cart is cleared.
    ///
    /// Returns whether this delivery created the order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a store operation fails.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn record_checkout_session(
        &self,
        session: &CheckoutSessionObject,
    ) -> Result<bool, OrderError> {
        let amount = session.amount_total.unwrap_or(0);
        let status = session.effective_status();
        let user_id = session.metadata_user_id();

        let (order, created) = self
            .orders
            .upsert_by_provider_session(&session.id, amount, status, user_id)
            .await?;

        if created {
            info!(order_id = %order.id, amount, status, "order created");

            if let Some(user_id) = user_id {
                self.carts.delete(user_id).await?;
                info!(%user_id, "cart cleared after payment confirmation");
            }
        }

        Ok(created)
    }

    /// Success-redirect fallback: fetch the session from the provider and,
    /// if it reports a settled payment, reconcile it exactly as a webhook
    /// delivery would. Covers the window where the customer returns before
    /// the webhook lands.
    ///
    /// Returns whether the session was settled (not whether the order was
    /// newly created - a webhook may have won the race, which is fine).
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Provider` if the session cannot be retrieved.
    #[instrument(skip(self, stripe))]
    pub async fn finalize(
        &self,
        stripe: &StripeClient,
        session_id: &str,
    ) -> Result<bool, OrderError> {
        let session = stripe.retrieve_checkout_session(session_id).await?;

        if !session.is_paid() {
            return Ok(false);
        }

        self.record_checkout_session(&session).await?;

        Ok(true)
    }
}
