//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cedarloom_core::{Email, UserId};

/// A storefront user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// First name (may be empty).
    pub first_name: String,
    /// Last name (may be empty).
    pub last_name: String,
    /// Display avatar URL.
    pub profile_image: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// The authenticated user's public profile.
///
/// This is what session resolution hands to handlers and what the auth
/// endpoints serialize - never password material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: UserId,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub profile_image: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_image: user.profile_image,
        }
    }
}

/// Default avatar URL for a new user, seeded by first name or email.
#[must_use]
pub fn default_profile_image(seed: &str) -> String {
    format!("https://avatar.vercel.sh/{}", urlencoding::encode(seed))
}
