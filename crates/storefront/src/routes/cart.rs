//! Cart route handlers.
//!
//! Mutations are server-side form actions that redirect back to the cart;
//! the cart itself is a JSON projection with a computed subtotal.

use axum::{
    Form, Json,
    extract::State,
    response::Redirect,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cedarloom_core::ProductId;

use crate::error::AppError;
use crate::middleware::auth::RequireUser;
use crate::models::cart::Cart;
use crate::services::cart::CartService;
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// One cart line as serialized to the storefront.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub quantity: u32,
    pub line_total: Decimal,
}

/// Cart projection with computed subtotal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Decimal,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart
                .items
                .iter()
                .map(|item| CartItemView {
                    id: item.id,
                    name: item.name.clone(),
                    price: item.price,
                    image: item.image.clone(),
                    quantity: item.quantity,
                    line_total: item.price * Decimal::from(item.quantity),
                })
                .collect(),
            subtotal: cart.subtotal(),
            item_count: cart.item_count(),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
}

/// Remove-from-cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart as JSON. An absent cart is the empty cart.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<CartView>, AppError> {
    let carts = CartService::new(state.pool());
    let cart = carts.get_cart(user.id).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Add one unit of a product to the current user's cart.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError> {
    let carts = CartService::new(state.pool());
    carts.add_item(user.id, form.product_id).await?;

    Ok(Redirect::to("/cart"))
}

/// Remove a product's line from the current user's cart.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect, AppError> {
    let carts = CartService::new(state.pool());
    carts.remove_item(user.id, form.product_id).await?;

    Ok(Redirect::to("/cart"))
}

/// Start checkout: create a provider-hosted session and redirect to it.
///
/// An empty cart redirects back to the cart page; nothing is created and
/// nothing is cleared - the cart only empties once payment is confirmed.
#[instrument(skip(state, user))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Redirect, AppError> {
    let service = CheckoutService::new(state.pool(), state.stripe(), &state.config().base_url);

    match service.checkout(user.id).await? {
        Some(url) => Ok(Redirect::to(&url)),
        None => Ok(Redirect::to("/cart")),
    }
}
