//! Checkout service.
//!
//! Converts a cart into a provider-hosted checkout session and hands back the
//! redirect URL. Initiating checkout is not proof of payment: no order is
//! created and no cart is cleared here - both happen only in reconciliation
//! once the provider confirms payment.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use cedarloom_core::UserId;

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::models::cart::CartItem;
use crate::stripe::{CheckoutLineItem, CheckoutSessionRequest, StripeClient, StripeError};

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A snapshot price could not be expressed in minor units.
    #[error("line price not representable in minor units: {0}")]
    InvalidPrice(Decimal),

    /// Payment provider failure. Retryable when the underlying error is.
    #[error("payment provider error: {0}")]
    Provider(#[from] StripeError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Checkout service.
pub struct CheckoutService<'a> {
    carts: CartRepository<'a>,
    stripe: &'a StripeClient,
    base_url: &'a str,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, stripe: &'a StripeClient, base_url: &'a str) -> Self {
        Self {
            carts: CartRepository::new(pool),
            stripe,
            base_url,
        }
    }

    /// Convert the user's cart into a hosted checkout session.
    ///
    /// An empty or absent cart is a no-op: `Ok(None)`, no provider call.
    /// Otherwise returns the provider-hosted redirect URL. The owning user id
    /// rides along as opaque metadata so the webhook can attribute the order.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Provider` if the provider call fails; a
    /// timeout is retryable and never leaves a partial order behind.
    #[instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId) -> Result<Option<String>, CheckoutError> {
        let Some((cart, _)) = self.carts.get(user_id).await? else {
            return Ok(None);
        };

        if cart.is_empty() {
            return Ok(None);
        }

        let line_items = cart
            .items
            .iter()
            .map(to_line_item)
            .collect::<Result<Vec<_>, _>>()?;

        let request = CheckoutSessionRequest {
            line_items,
            success_url: format!(
                "{}/payments/success?session_id={{CHECKOUT_SESSION_ID}}",
                self.base_url
            ),
            cancel_url: format!("{}/cart", self.base_url),
            user_id: Some(user_id),
        };

        let session = self.stripe.create_checkout_session(&request).await?;

        let url = session.url.ok_or(StripeError::MissingRedirectUrl)?;

        Ok(Some(url))
    }
}

/// Convert one cart line into a provider line item.
fn to_line_item(item: &CartItem) -> Result<CheckoutLineItem, CheckoutError> {
    Ok(CheckoutLineItem {
        name: item.name.clone(),
        image: (!item.image.is_empty()).then(|| item.image.clone()),
        unit_amount: to_minor_units(item.price).ok_or(CheckoutError::InvalidPrice(item.price))?,
        quantity: item.quantity,
    })
}

/// Express a standard-unit price in minor units (cents).
///
/// Snapshot prices carry at most two decimal places, so the rounding here is
/// exact for well-formed data; it exists to keep a corrupt snapshot from
/// producing a fractional-cent amount.
fn to_minor_units(price: Decimal) -> Option<i64> {
    (price * Decimal::ONE_HUNDRED).round().to_i64()
}

#[cfg(test)]
mod tests {
    use cedarloom_core::ProductId;

    use super::*;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(Decimal::from(20)), Some(2000));
        assert_eq!(to_minor_units(Decimal::new(1999, 2)), Some(1999));
        assert_eq!(to_minor_units(Decimal::new(1, 2)), Some(1));
        assert_eq!(to_minor_units(Decimal::from(0)), Some(0));
    }

    #[test]
    fn test_line_item_carries_quantity_and_minor_units() {
        let item = CartItem {
            id: ProductId::generate(),
            name: "runner".to_string(),
            price: Decimal::from(20),
            image: "https://img.example.com/runner.jpg".to_string(),
            quantity: 2,
        };

        let line = to_line_item(&item).expect("converts");
        assert_eq!(line.unit_amount, 2000);
        assert_eq!(line.quantity, 2);
        assert_eq!(line.name, "runner");
        assert!(line.image.is_some());
    }

    #[test]
    fn test_empty_image_becomes_none() {
        let item = CartItem {
            id: ProductId::generate(),
            name: "runner".to_string(),
            price: Decimal::from(20),
            image: String::new(),
            quantity: 1,
        };

        let line = to_line_item(&item).expect("converts");
        assert!(line.image.is_none());
    }
}
