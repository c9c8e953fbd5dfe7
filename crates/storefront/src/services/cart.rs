//! Cart service.
//!
//! The cart aggregate: add/remove with quantity merging, projection with
//! subtotal, and payment-gated clearing. All writes go through the
//! repository's versioned write path with a bounded retry, so two concurrent
//! adds for the same user both land instead of one silently vanishing.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use cedarloom_core::{ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::models::cart::Cart;
use crate::models::product::ProductSnapshot;

/// Attempts before a contended write gives up.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product to add does not exist.
    #[error("no product with this id")]
    ProductNotFound,

    /// Versioned write lost to concurrent writers on every attempt.
    #[error("cart modified concurrently, retry")]
    Contention,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart service.
pub struct CartService<'a> {
    carts: CartRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            carts: CartRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Add one unit of a product to the user's cart.
    ///
    /// Snapshots the product's current name/price/image into the line; an
    /// existing line for the product has its quantity incremented instead of
    /// a duplicate line being appended.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product does not exist.
    /// Returns `CartError::Contention` if every write attempt lost the
    /// version race.
    #[instrument(skip(self))]
    pub async fn add_item(&self, user_id: UserId, product_id: ProductId) -> Result<Cart, CartError> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        let snapshot = ProductSnapshot::from(&product);

        self.write_with_retry(user_id, |cart| cart.add_snapshot(snapshot.clone()))
            .await
    }

    /// Remove a product's line from the user's cart.
    ///
    /// Removing a line that is not present (or from an absent cart) is a
    /// no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Contention` if every write attempt lost the
    /// version race.
    #[instrument(skip(self))]
    pub async fn remove_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Cart, CartError> {
        if self.carts.get(user_id).await?.is_none() {
            return Ok(Cart::empty(user_id));
        }

        self.write_with_retry(user_id, |cart| cart.remove_item(product_id))
            .await
    }

    /// Load the user's cart. An absent row is the empty cart.
    ///
    /// Pure projection - no side effects.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn get_cart(&self, user_id: UserId) -> Result<Cart, CartError> {
        let cart = self
            .carts
            .get(user_id)
            .await?
            .map_or_else(|| Cart::empty(user_id), |(cart, _)| cart);

        Ok(cart)
    }

    /// Delete the user's cart row entirely.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the delete fails.
    pub async fn clear_cart(&self, user_id: UserId) -> Result<(), CartError> {
        self.carts.delete(user_id).await?;
        Ok(())
    }

    /// Read-mutate-write with optimistic versioning.
    ///
    /// Each attempt re-reads the current document, applies the mutation to
    /// that fresh copy, and writes back guarded by the version it read. A
    /// lost race (insert collision or stale version) triggers a re-read.
    async fn write_with_retry(
        &self,
        user_id: UserId,
        mutate: impl Fn(&mut Cart),
    ) -> Result<Cart, CartError> {
        for attempt in 0..MAX_WRITE_ATTEMPTS {
            if attempt > 0 {
                tracing::debug!(%user_id, attempt, "retrying contended cart write");
            }

            let existing = self.carts.get(user_id).await?;

            match existing {
                None => {
                    let mut cart = Cart::empty(user_id);
                    mutate(&mut cart);
                    if self.carts.try_insert(user_id, &cart.items).await? {
                        return Ok(cart);
                    }
                }
                Some((mut cart, version)) => {
                    mutate(&mut cart);
                    if self.carts.try_update(user_id, &cart.items, version).await? {
                        return Ok(cart);
                    }
                }
            }
        }

        Err(CartError::Contention)
    }
}
