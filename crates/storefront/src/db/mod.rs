//! Database operations for the storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` - Site authentication identities
//! - `sessions` - Opaque bearer tokens with absolute expiry
//! - `products` - Catalog rows read when snapshotting cart lines
//! - `carts` - One cart document per user, optimistic `version` counter
//! - `orders` - One row per provider checkout session (idempotency key)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cedarloom-cli -- migrate
//! ```
//!
//! Queries are runtime-checked (`sqlx::query`/`query_as`), so the workspace
//! builds without a reachable database.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod carts;
pub mod orders;
pub mod products;
pub mod sessions;
pub mod users;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use sessions::SessionRepository;
pub use users::UserRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique constraint violation (e.g. duplicate email).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Row expected but not found.
    #[error("not found")]
    NotFound,

    /// Stored data failed domain validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// The pool is constructed once at startup and passed to each component via
/// application state; nothing reaches for it through a global.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
