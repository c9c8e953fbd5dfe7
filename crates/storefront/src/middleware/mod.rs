//! HTTP middleware and extractors.

pub mod auth;
pub mod session;

pub use auth::{OptionalUser, RequireUser};
pub use session::{
    SESSION_COOKIE_NAME, clear_session_cookie, session_cookie, session_token_from_headers,
};
