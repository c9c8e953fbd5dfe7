//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use cedarloom_core::{Email, UserId};

use super::RepositoryError;
use crate::models::user::User;

/// Hex-encoded scrypt material for a password-bearing user.
#[derive(Debug, Clone)]
pub struct StoredPassword {
    pub salt: String,
    pub hash: String,
}

/// Raw user row as stored.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    profile_image: String,
    created_at: DateTime<Utc>,
}

/// User row plus optional password material (login path only).
#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    profile_image: String,
    created_at: DateTime<Utc>,
    password_salt: Option<String>,
    password_hash: Option<String>,
}

fn to_user(row: UserRow) -> Result<User, RepositoryError> {
    let email = Email::parse(&row.email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
    })?;

    Ok(User {
        id: UserId::new(row.id),
        email,
        first_name: row.first_name,
        last_name: row.last_name,
        profile_image: row.profile_image,
        created_at: row.created_at,
    })
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address (exact, case-sensitive match).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, first_name, last_name, profile_image, created_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(to_user).transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, email, first_name, last_name, profile_image, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        row.map(to_user).transpose()
    }

    /// Create a new user with email, profile fields and password material.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        email: &Email,
        first_name: &str,
        last_name: &str,
        profile_image: &str,
        password: &StoredPassword,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (id, email, first_name, last_name, profile_image,
                               password_salt, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, first_name, last_name, profile_image, created_at
            ",
        )
        .bind(UserId::generate().as_uuid())
        .bind(email.as_str())
        .bind(first_name)
        .bind(last_name)
        .bind(profile_image)
        .bind(&password.salt)
        .bind(&password.hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        to_user(row)
    }

    /// Get a user together with their stored password material, by email.
    ///
    /// Returns `None` if no such user exists. A user that exists but carries
    /// no password material (the lazily provisioned admin row) comes back as
    /// `(user, None)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<StoredPassword>)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(
            r"
            SELECT id, email, first_name, last_name, profile_image, created_at,
                   password_salt, password_hash
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(r) = row else {
            return Ok(None);
        };

        let password = match (r.password_salt, r.password_hash) {
            (Some(salt), Some(hash)) => Some(StoredPassword { salt, hash }),
            _ => None,
        };

        let user = to_user(UserRow {
            id: r.id,
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            profile_image: r.profile_image,
            created_at: r.created_at,
        })?;

        Ok(Some((user, password)))
    }

    /// Get or lazily create the passwordless admin user row.
    ///
    /// Two concurrent first logins can both reach the insert; the unique
    /// email index makes one a no-op and the follow-up select resolves both
    /// to the same row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the row vanishes between
    /// insert and select.
    pub async fn ensure_admin(
        &self,
        email: &Email,
        profile_image: &str,
    ) -> Result<User, RepositoryError> {
        if let Some(existing) = self.get_by_email(email).await? {
            return Ok(existing);
        }

        sqlx::query(
            r"
            INSERT INTO users (id, email, first_name, last_name, profile_image)
            VALUES ($1, $2, 'Admin', '', $3)
            ON CONFLICT (email) DO NOTHING
            ",
        )
        .bind(UserId::generate().as_uuid())
        .bind(email.as_str())
        .bind(profile_image)
        .execute(self.pool)
        .await?;

        self.get_by_email(email).await?.ok_or_else(|| {
            RepositoryError::DataCorruption("admin row missing after insert".to_owned())
        })
    }
}
