//! Stripe API client.
//!
//! Provides methods for creating and retrieving hosted checkout sessions.
//! Every request carries a bounded timeout; transport failures surface as
//! retryable errors and never as partial orders.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::error::StripeError;
use super::types::{CheckoutSessionObject, CheckoutSessionRequest, METADATA_USER_ID};

/// Stripe API base URL.
const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Request timeout for Stripe calls.
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Error body shape returned by the Stripe API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    /// HTTP client.
    client: Client,
    /// API secret key.
    secret_key: SecretString,
    /// API base URL (overridable for tests).
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(secret_key: SecretString) -> Self {
        Self::with_api_base(secret_key, STRIPE_API_BASE.to_string())
    }

    /// Create a client against a non-default API base (tests).
    #[must_use]
    pub fn with_api_base(secret_key: SecretString, api_base: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            secret_key,
            api_base,
        }
    }

    /// Create a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Request` on transport failure (retryable),
    /// `StripeError::Api` on a non-success response.
    #[instrument(skip(self, request), fields(lines = request.line_items.len()))]
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSessionObject, StripeError> {
        let form = build_session_form(request);

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let session = decode_session_response(response).await?;
        debug!(session_id = %session.id, "checkout session created");

        Ok(session)
    }

    /// Retrieve an existing checkout session by id.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Request` on transport failure (retryable),
    /// `StripeError::Api` on a non-success response.
    #[instrument(skip(self))]
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSessionObject, StripeError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{session_id}", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        decode_session_response(response).await
    }
}

/// Decode a session response, mapping non-success statuses to `Api` errors.
async fn decode_session_response(
    response: reqwest::Response,
) -> Result<CheckoutSessionObject, StripeError> {
    let status = response.status();

    if !status.is_success() {
        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .and_then(|detail| detail.message)
            .unwrap_or_else(|| "unknown error".to_string());

        return Err(StripeError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<CheckoutSessionObject>()
        .await
        .map_err(|e| StripeError::Decode(e.to_string()))
}

/// Flatten a session request into Stripe's bracketed form encoding.
fn build_session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    for (i, item) in request.line_items.iter().enumerate() {
        form.push((
            format!("line_items[{i}][price_data][currency]"),
            "usd".to_string(),
        ));
        form.push((
            format!("line_items[{i}][price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((
            format!("line_items[{i}][price_data][product_data][name]"),
            item.name.clone(),
        ));
        if let Some(image) = &item.image {
            form.push((
                format!("line_items[{i}][price_data][product_data][images][0]"),
                image.clone(),
            ));
        }
        form.push((
            format!("line_items[{i}][quantity]"),
            item.quantity.to_string(),
        ));
    }

    if let Some(user_id) = request.user_id {
        form.push((format!("metadata[{METADATA_USER_ID}]"), user_id.to_string()));
    }

    form
}

#[cfg(test)]
mod tests {
    use cedarloom_core::UserId;

    use super::super::types::CheckoutLineItem;
    use super::*;

    fn request_with_two_lines() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            line_items: vec![
                CheckoutLineItem {
                    name: "runner".to_string(),
                    image: Some("https://img.example.com/runner.jpg".to_string()),
                    unit_amount: 2000,
                    quantity: 2,
                },
                CheckoutLineItem {
                    name: "loafer".to_string(),
                    image: None,
                    unit_amount: 1500,
                    quantity: 1,
                },
            ],
            success_url: "https://shop.example.com/payments/success?session_id={CHECKOUT_SESSION_ID}"
                .to_string(),
            cancel_url: "https://shop.example.com/cart".to_string(),
            user_id: Some(UserId::generate()),
        }
    }

    fn form_value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_form_carries_minor_units_and_quantities() {
        let form = build_session_form(&request_with_two_lines());

        assert_eq!(form_value(&form, "mode"), Some("payment"));
        assert_eq!(
            form_value(&form, "line_items[0][price_data][unit_amount]"),
            Some("2000")
        );
        assert_eq!(form_value(&form, "line_items[0][quantity]"), Some("2"));
        assert_eq!(
            form_value(&form, "line_items[1][price_data][unit_amount]"),
            Some("1500")
        );
        assert_eq!(form_value(&form, "line_items[1][quantity]"), Some("1"));
        // Second line has no image, so no images entry is emitted for it.
        assert_eq!(
            form_value(&form, "line_items[1][price_data][product_data][images][0]"),
            None
        );
    }

    #[test]
    fn test_form_embeds_user_metadata() {
        let request = request_with_two_lines();
        let form = build_session_form(&request);

        let user_id = request.user_id.expect("set in fixture");
        assert_eq!(
            form_value(&form, "metadata[userId]"),
            Some(user_id.to_string().as_str())
        );
    }

    #[test]
    fn test_guest_request_has_no_metadata() {
        let mut request = request_with_two_lines();
        request.user_id = None;

        let form = build_session_form(&request);
        assert!(form.iter().all(|(k, _)| !k.starts_with("metadata[")));
    }

    #[test]
    fn test_debug_redacts_secret_key() {
        let client = StripeClient::new(SecretString::from("sk_test_secret_value"));
        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_test_secret_value"));
    }
}
