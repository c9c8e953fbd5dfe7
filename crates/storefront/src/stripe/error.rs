//! Stripe error types.

use thiserror::Error;

/// Errors from the Stripe integration.
#[derive(Debug, Error)]
pub enum StripeError {
    /// Transport failure (timeout, connection refused). Retryable.
    #[error("stripe request failed: {0}")]
    Request(String),

    /// Stripe returned a non-success status.
    #[error("stripe api error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, if any.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("failed to decode stripe response: {0}")]
    Decode(String),

    /// The created session carried no redirect URL.
    #[error("checkout session has no redirect url")]
    MissingRedirectUrl,

    /// Webhook signature verification failed.
    #[error("invalid webhook signature: {0}")]
    InvalidSignature(String),

    /// Webhook payload could not be parsed after verification.
    #[error("failed to parse webhook payload: {0}")]
    Payload(String),
}

impl StripeError {
    /// Whether the failure is transient and the caller may retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}
