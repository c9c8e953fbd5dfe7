//! Stripe API and webhook types.

use std::collections::HashMap;

use serde::Deserialize;

use cedarloom_core::UserId;

/// Metadata key under which checkout sessions carry the owning user id.
pub const METADATA_USER_ID: &str = "userId";

/// One line of a checkout session request.
#[derive(Debug, Clone)]
pub struct CheckoutLineItem {
    /// Display name forwarded to the hosted page.
    pub name: String,
    /// Product image URL, if any.
    pub image: Option<String>,
    /// Unit amount in minor currency units (cents).
    pub unit_amount: i64,
    /// Units of this line.
    pub quantity: u32,
}

/// Request to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub line_items: Vec<CheckoutLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    /// Embedded as opaque metadata so the webhook can attribute the order.
    pub user_id: Option<UserId>,
}

/// A checkout session as returned by the API and carried in webhook events.
///
/// Fields the provider may omit are optional; the reconciler applies its own
/// fallbacks.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    /// Provider session id - the idempotency key for orders.
    pub id: String,
    /// Hosted page redirect URL (present on freshly created sessions).
    #[serde(default)]
    pub url: Option<String>,
    /// Final total in minor currency units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Payment status (e.g. "paid", "unpaid").
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Session status (e.g. "complete", "open").
    #[serde(default)]
    pub status: Option<String>,
    /// Opaque metadata echoed back from session creation.
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl CheckoutSessionObject {
    /// The user id embedded at checkout time, if present and well-formed.
    #[must_use]
    pub fn metadata_user_id(&self) -> Option<UserId> {
        self.metadata
            .as_ref()?
            .get(METADATA_USER_ID)?
            .parse()
            .ok()
    }

    /// Effective order status: payment status, falling back to session
    /// status, falling back to "pending".
    #[must_use]
    pub fn effective_status(&self) -> &str {
        self.payment_status
            .as_deref()
            .or(self.status.as_deref())
            .unwrap_or("pending")
    }

    /// Whether the session represents a settled payment.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status.as_deref() == Some("paid")
            || self.status.as_deref() == Some("complete")
    }
}

/// The webhook event envelope.
///
/// A closed tagged decode over the provider's `type` field. Event types this
/// system does not handle fall into the explicit `Unknown` arm so they can be
/// acknowledged rather than rejected - new provider event types must not
/// break the endpoint.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookEvent {
    /// The hosted checkout completed; the payment may now be reconciled.
    #[serde(rename = "checkout.session.completed")]
    CheckoutSessionCompleted {
        /// Event payload wrapper.
        data: EventData,
    },

    /// Any event type this system does not handle.
    #[serde(other)]
    Unknown,
}

/// Payload wrapper inside an event envelope.
#[derive(Debug, Deserialize)]
pub struct EventData {
    /// The checkout session the event describes.
    pub object: CheckoutSessionObject,
}
