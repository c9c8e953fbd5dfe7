//! Stripe payment provider integration.
//!
//! Two concerns live here:
//! - [`client`] - outbound calls: create and retrieve hosted checkout
//!   sessions.
//! - [`webhook`] - inbound notifications: signature verification over the
//!   exact raw payload, then a closed tagged decode of the event envelope.

pub mod client;
pub mod error;
pub mod types;
pub mod webhook;

pub use client::StripeClient;
pub use error::StripeError;
pub use types::{CheckoutLineItem, CheckoutSessionObject, CheckoutSessionRequest, WebhookEvent};
