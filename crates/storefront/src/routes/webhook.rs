//! Payment webhook route handlers.
//!
//! The webhook body must stay raw bytes until the signature over it has been
//! verified; only then is the event envelope decoded. Unknown event types are
//! acknowledged with 200 per the provider contract - rejecting them would
//! break forward compatibility.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::services::orders::OrderService;
use crate::state::AppState;
use crate::stripe::webhook::construct_event;
use crate::stripe::types::WebhookEvent;

/// Signature header carried on provider notifications.
const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// Handle a provider notification.
///
/// Responds 400 on signature failure (so the provider's retry policy
/// governs redelivery) and 200 otherwise, including for ignored event types.
#[instrument(skip(state, headers, body))]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature header".into()))?;

    let event = construct_event(&body, signature, &state.config().stripe.webhook_secret)?;

    match event {
        WebhookEvent::CheckoutSessionCompleted { data } => {
            let orders = OrderService::new(state.pool());
            orders.record_checkout_session(&data.object).await?;
        }
        WebhookEvent::Unknown => {
            debug!("unhandled event");
        }
    }

    Ok(StatusCode::OK)
}

/// Success-redirect query parameters.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<String>,
}

/// Success-redirect fallback.
///
/// Retrieves the session from the provider and reconciles it if paid; the
/// webhook may already have done so, in which case this is a no-op update.
#[instrument(skip(state))]
pub async fn success(
    State(state): State<AppState>,
    Query(query): Query<SuccessQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session_id = query
        .session_id
        .ok_or_else(|| AppError::BadRequest("session_id is required".into()))?;

    let orders = OrderService::new(state.pool());
    let settled = orders.finalize(state.stripe(), &session_id).await?;

    Ok(Json(json!({ "ok": settled })))
}
