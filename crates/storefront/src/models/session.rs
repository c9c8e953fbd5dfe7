//! Session domain types.
//!
//! Sessions are opaque bearer tokens with a fixed absolute expiry. There is
//! no renewal: a token is valid until `expires_at` and dead afterwards.

use chrono::{DateTime, Utc};

use cedarloom_core::UserId;

/// Fixed session lifetime in seconds (7 days).
pub const SESSION_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// A server-side session row mapping an opaque token to a user.
#[derive(Debug, Clone)]
pub struct Session {
    /// High-entropy opaque bearer token (64 hex chars).
    pub token: String,
    /// The owning user.
    pub user_id: UserId,
    /// Absolute expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether this session has passed its expiry at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
