//! Authentication route handlers.
//!
//! JSON endpoints for signup, login, logout, and current-user lookup. The
//! session token rides in an HTTP-only cookie set here and cleared on logout.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::auth::OptionalUser;
use crate::middleware::session::{
    clear_session_cookie, session_cookie, session_token_from_headers,
};
use crate::services::auth::AuthService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Signup request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn require_credentials<'a>(
    email: Option<&'a str>,
    password: Option<&'a str>,
) -> Result<(&'a str, &'a str), AppError> {
    match (email, password) {
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
            Ok((email, password))
        }
        _ => Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        )),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle signup.
///
/// Rejects the reserved admin email (400) and duplicate emails (409). On
/// success opens a session and returns 201 with the public profile.
#[instrument(skip(state, request))]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Response, AppError> {
    let (email, password) =
        require_credentials(request.email.as_deref(), request.password.as_deref())?;

    let auth = AuthService::new(state.pool(), &state.config().admin);
    let (user, token) = auth
        .signup(
            email,
            password,
            request.first_name.as_deref().unwrap_or(""),
            request.last_name.as_deref().unwrap_or(""),
        )
        .await?;

    let cookie = session_cookie(&token, state.config().is_secure());

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "user": user })),
    )
        .into_response())
}

/// Handle login.
///
/// The admin branch is checked first against operator configuration; normal
/// users verify against their stored hash. Unknown email and wrong password
/// produce the same 401.
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (email, password) =
        require_credentials(request.email.as_deref(), request.password.as_deref())?;

    let auth = AuthService::new(state.pool(), &state.config().admin);
    let (user, token) = auth.login(email, password).await?;

    let cookie = session_cookie(&token, state.config().is_secure());

    Ok((
        StatusCode::OK,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "user": user })),
    )
        .into_response())
}

/// Handle logout.
///
/// Idempotent: destroying an absent session still clears the cookie and
/// reports success.
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = session_token_from_headers(&headers) {
        let auth = AuthService::new(state.pool(), &state.config().admin);
        auth.destroy_session(&token).await?;
    }

    let cookie = clear_session_cookie(state.config().is_secure());

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "success": true })),
    )
        .into_response())
}

/// Return the current user, or null when not authenticated.
///
/// Expired and absent sessions are indistinguishable here by design.
pub async fn me(OptionalUser(user): OptionalUser) -> Json<serde_json::Value> {
    Json(json!({ "user": user }))
}
