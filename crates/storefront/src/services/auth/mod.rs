//! Authentication service.
//!
//! Covers credential issuance/verification and the session lifecycle:
//! signup, login (including the operator-configured admin branch), opaque
//! session tokens with a fixed 7-day TTL, and lazy expiry on lookup.

mod error;
pub mod password;

pub use error::AuthError;

use chrono::{TimeDelta, Utc};
use rand::RngCore;
use secrecy::ExposeSecret;
use sqlx::PgPool;

use cedarloom_core::{Email, UserId};

use crate::config::AdminConfig;
use crate::db::RepositoryError;
use crate::db::sessions::SessionRepository;
use crate::db::users::{StoredPassword, UserRepository};
use crate::models::session::SESSION_TTL_SECONDS;
use crate::models::user::{AuthUser, default_profile_image};

use password::{constant_time_eq, hash_password, verify_password};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Session token length in random bytes (hex-encoded to 64 chars).
const SESSION_TOKEN_BYTES: usize = 32;

/// Authentication service.
///
/// Handles user registration, login, and session lifecycle.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    sessions: SessionRepository<'a>,
    admin: &'a AdminConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, admin: &'a AdminConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            sessions: SessionRepository::new(pool),
            admin,
        }
    }

    // =========================================================================
    // Registration and Login
    // =========================================================================

    /// Register a new user with email and password and open a session.
    ///
    /// The configured admin email is reserved and rejected before any
    /// database work; comparison is exact and case-sensitive, matching the
    /// storage layer's unique index.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::ReservedEmail` for the admin email.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<(AuthUser, String), AuthError> {
        let email = Email::parse(email)?;

        if email.as_str() == self.admin.email.as_str() {
            return Err(AuthError::ReservedEmail);
        }

        validate_password(password)?;

        let (salt, hash) = hash_password(password)?;

        let avatar_seed = if first_name.is_empty() {
            email.as_str()
        } else {
            first_name
        };
        let profile_image = default_profile_image(avatar_seed);

        let user = self
            .users
            .create_with_password(
                &email,
                first_name,
                last_name,
                &profile_image,
                &StoredPassword { salt, hash },
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })?;

        let token = self.create_session(user.id).await?;

        Ok((user.into(), token))
    }

    /// Login with email and password and open a session.
    ///
    /// The admin branch is checked first: when the email matches the
    /// configured admin email and an admin password is configured, the
    /// password is compared against configuration (constant-time) and a
    /// passwordless user row is lazily provisioned on first success. The
    /// branch never falls through to stored-hash verification.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password - identical in both cases.
    pub async fn login(&self, email: &str, password: &str) -> Result<(AuthUser, String), AuthError> {
        let email = Email::parse(email)?;

        if email.as_str() == self.admin.email.as_str()
            && let Some(admin_password) = self.admin.password.as_ref()
        {
            if !constant_time_eq(
                password.as_bytes(),
                admin_password.expose_secret().as_bytes(),
            ) {
                return Err(AuthError::InvalidCredentials);
            }

            let user = self.ensure_admin_user().await?;
            let token = self.create_session(user.id).await?;
            return Ok((user, token));
        }

        let (user, stored) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(stored) = stored else {
            // Row exists but carries no password material (admin row when no
            // ADMIN_PASSWORD is configured).
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &stored.salt, &stored.hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.create_session(user.id).await?;

        Ok((user.into(), token))
    }

    /// Get or lazily create the admin user row.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn ensure_admin_user(&self) -> Result<AuthUser, AuthError> {
        let email = Email::parse(&self.admin.email)?;
        let profile_image = default_profile_image(email.as_str());
        let user = self.users.ensure_admin(&email, &profile_image).await?;
        Ok(user.into())
    }

    // =========================================================================
    // Session Lifecycle
    // =========================================================================

    /// Create a session for the user and return its opaque token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the insert fails.
    pub async fn create_session(&self, user_id: UserId) -> Result<String, AuthError> {
        let token = generate_session_token();
        let expires_at = Utc::now() + TimeDelta::seconds(SESSION_TTL_SECONDS);

        self.sessions.create(&token, user_id, expires_at).await?;

        Ok(token)
    }

    /// Resolve a session token to the owning user's public profile.
    ///
    /// Absent tokens and expired tokens both resolve to `None` - callers can
    /// never distinguish the two. An expired row is deleted on this first
    /// late lookup (lazy expiry; racing deletes are harmless no-ops). A
    /// session whose user has been deleted also resolves to `None`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if a query fails.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<AuthUser>, AuthError> {
        let Some(session) = self.sessions.get(token).await? else {
            return Ok(None);
        };

        if session.is_expired_at(Utc::now()) {
            self.sessions.delete(token).await?;
            return Ok(None);
        }

        let user = self.users.get_by_id(session.user_id).await?;

        Ok(user.map(AuthUser::from))
    }

    /// Destroy a session. Destroying an absent session is not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the delete fails.
    pub async fn destroy_session(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.delete(token).await?;
        Ok(())
    }
}

/// Generate a high-entropy opaque session token (64 hex chars).
fn generate_session_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_shape() {
        let token = generate_session_token();
        assert_eq!(token.len(), SESSION_TOKEN_BYTES * 2);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_session_tokens_are_unique() {
        assert_ne!(generate_session_token(), generate_session_token());
    }

    #[test]
    fn test_validate_password_too_short() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[test]
    fn test_validate_password_ok() {
        assert!(validate_password("long enough").is_ok());
    }
}
