//! Authentication extractors.
//!
//! Identity is resolved once per inbound request - cookie to session row to
//! public profile - and handed to handlers as a value. Nothing downstream
//! re-derives it mid-call.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};

use crate::models::user::AuthUser;
use crate::services::auth::AuthService;
use crate::state::AppState;

use super::session::session_token_from_headers;

/// Extractor that requires an authenticated user.
///
/// Absent and expired sessions are rejected identically.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub AuthUser);

/// Error returned when authentication is required but absent.
pub enum AuthRejection {
    /// Redirect home (storefront form actions).
    RedirectHome,
    /// Unauthorized response (JSON endpoints).
    Unauthorized,
    /// Session lookup failed.
    Internal,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectHome => Redirect::to("/").into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

/// Whether an unauthenticated request to this path should get a JSON-style
/// 401 rather than a redirect.
fn wants_unauthorized(parts: &Parts) -> bool {
    parts.uri.path().starts_with("/auth") || parts.uri.path().starts_with("/payments")
}

async fn resolve_from_parts(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, ()> {
    let Some(token) = session_token_from_headers(&parts.headers) else {
        return Ok(None);
    };

    let auth = AuthService::new(state.pool(), &state.config().admin);
    auth.resolve_session(&token).await.map_err(|e| {
        tracing::error!("session resolution failed: {e}");
    })
}

impl<S> FromRequestParts<S> for RequireUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);

        let user = resolve_from_parts(parts, &app)
            .await
            .map_err(|()| AuthRejection::Internal)?;

        user.map(Self).ok_or_else(|| {
            if wants_unauthorized(parts) {
                AuthRejection::Unauthorized
            } else {
                AuthRejection::RedirectHome
            }
        })
    }
}

/// Extractor that optionally resolves the current user.
///
/// Unlike `RequireUser`, this does not reject unauthenticated requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     OptionalUser(user): OptionalUser,
/// ) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.email),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
pub struct OptionalUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app = AppState::from_ref(state);

        let user = resolve_from_parts(parts, &app).await.unwrap_or_default();

        Ok(Self(user))
    }
}
