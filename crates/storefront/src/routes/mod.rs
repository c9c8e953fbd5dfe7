//! HTTP route handlers for the storefront core.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Auth (JSON)
//! POST /auth/signup            - Register and open a session
//! POST /auth/login             - Login (admin branch checked first)
//! POST /auth/logout            - Destroy session, clear cookie
//! GET  /auth/me                - Current user or null
//!
//! # Cart (server-side form actions + JSON projection)
//! GET  /cart                   - Cart view with subtotal
//! POST /cart/add               - Add one unit of a product
//! POST /cart/remove            - Remove a product's line
//! POST /cart/checkout          - Create hosted checkout, redirect
//!
//! # Payments
//! POST /payments/webhook       - Provider notifications (signed raw body)
//! GET  /payments/success       - Success-redirect finalize fallback
//! ```

pub mod auth;
pub mod cart;
pub mod webhook;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/checkout", post(cart::checkout))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook", post(webhook::webhook))
        .route("/success", get(webhook::success))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/cart", cart_routes())
        .nest("/payments", payment_routes())
}
