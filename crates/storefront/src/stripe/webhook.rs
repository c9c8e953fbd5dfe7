//! Stripe webhook signature verification and event parsing.
//!
//! The signature header has the form `t=<unix>,v1=<hex>[,v1=<hex>...]`. The
//! signed payload is `"{t}.{raw_body}"` and the scheme is HMAC-SHA256 with
//! the endpoint's signing secret. Verification runs over the exact raw bytes
//! before anything is parsed; a stale timestamp or a signature mismatch
//! rejects the delivery so the provider's retry policy takes over.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::error::StripeError;
use super::types::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted distance between the signed timestamp and now (replay
/// window), in seconds.
const TIMESTAMP_TOLERANCE_SECONDS: i64 = 300;

/// Verify a signature header against the raw payload, then parse the event.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` if the header is malformed, the
/// timestamp is outside the tolerance window, or no signature candidate
/// matches. Returns `StripeError::Payload` if the verified body fails to
/// parse.
pub fn construct_event(
    payload: &[u8],
    signature_header: &str,
    secret: &SecretString,
) -> Result<WebhookEvent, StripeError> {
    verify_signature(payload, signature_header, secret)?;

    serde_json::from_slice(payload).map_err(|e| StripeError::Payload(e.to_string()))
}

/// Verify the signature header against the raw payload.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` on any mismatch.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &SecretString,
) -> Result<(), StripeError> {
    let header = SignatureHeader::parse(signature_header)?;

    let now_secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|e| StripeError::InvalidSignature(e.to_string()))?
        .as_secs();

    let now = i64::try_from(now_secs)
        .map_err(|_| StripeError::InvalidSignature("system time overflow".to_string()))?;

    if (now - header.timestamp).abs() > TIMESTAMP_TOLERANCE_SECONDS {
        return Err(StripeError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let expected = expected_signature(payload, header.timestamp, secret)?;

    // Accept if any v1 candidate matches; each comparison is constant-time.
    if header
        .candidates
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature(
            "signature mismatch".to_string(),
        ))
    }
}

/// Compute the expected hex signature for a payload at a timestamp.
fn expected_signature(
    payload: &[u8],
    timestamp: i64,
    secret: &SecretString,
) -> Result<String, StripeError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| StripeError::InvalidSignature(e.to_string()))?;

    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Parsed `Stripe-Signature` header.
struct SignatureHeader {
    timestamp: i64,
    candidates: Vec<String>,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self, StripeError> {
        let mut timestamp = None;
        let mut candidates = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    timestamp = value.parse::<i64>().ok();
                }
                "v1" => candidates.push(value.to_string()),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            StripeError::InvalidSignature("missing or invalid timestamp".to_string())
        })?;

        if candidates.is_empty() {
            return Err(StripeError::InvalidSignature(
                "no v1 signature present".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            candidates,
        })
    }
}

/// Constant-time string comparison.
///
/// Accumulates the XOR of every byte pair rather than returning on the first
/// difference; a length mismatch is a non-match.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_timestamp() -> i64 {
        let secs = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time after epoch")
            .as_secs();
        i64::try_from(secs).expect("fits in i64")
    }

    fn sign(payload: &[u8], timestamp: i64, secret: &SecretString) -> String {
        let sig = expected_signature(payload, timestamp, secret).expect("signs");
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn test_valid_signature_accepted() {
        let secret = SecretString::from("whsec_test_secret");
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let header = sign(payload, current_timestamp(), &secret);

        assert!(verify_signature(payload, &header, &secret).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let secret = SecretString::from("whsec_test_secret");
        let payload = br#"{"amount":100}"#;
        let header = sign(payload, current_timestamp(), &secret);

        let tampered = br#"{"amount":999}"#;
        assert!(matches!(
            verify_signature(tampered, &header, &secret),
            Err(StripeError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let secret = SecretString::from("whsec_test_secret");
        let payload = br"{}";
        let header = sign(payload, current_timestamp(), &secret);

        let other = SecretString::from("whsec_other_secret");
        assert!(verify_signature(payload, &header, &other).is_err());
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let secret = SecretString::from("whsec_test_secret");
        let payload = br"{}";
        let stale = current_timestamp() - TIMESTAMP_TOLERANCE_SECONDS - 10;
        let header = sign(payload, stale, &secret);

        assert!(matches!(
            verify_signature(payload, &header, &secret),
            Err(StripeError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_missing_timestamp_rejected() {
        let secret = SecretString::from("whsec_test_secret");
        assert!(verify_signature(br"{}", "v1=abcdef", &secret).is_err());
    }

    #[test]
    fn test_missing_v1_rejected() {
        let secret = SecretString::from("whsec_test_secret");
        let header = format!("t={}", current_timestamp());
        assert!(verify_signature(br"{}", &header, &secret).is_err());
    }

    #[test]
    fn test_second_v1_candidate_accepted() {
        // Secret rotation: the provider may send one signature per active
        // secret. Any matching candidate passes.
        let secret = SecretString::from("whsec_test_secret");
        let payload = br"{}";
        let timestamp = current_timestamp();
        let good = expected_signature(payload, timestamp, &secret).expect("signs");
        let header = format!("t={timestamp},v1={},v1={good}", "0".repeat(64));

        assert!(verify_signature(payload, &header, &secret).is_ok());
    }

    #[test]
    fn test_construct_event_parses_after_verification() {
        let secret = SecretString::from("whsec_test_secret");
        let payload = serde_json::json!({
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_test_1", "payment_status": "paid" } }
        })
        .to_string();
        let header = sign(payload.as_bytes(), current_timestamp(), &secret);

        let event =
            construct_event(payload.as_bytes(), &header, &secret).expect("verifies and parses");
        assert!(matches!(
            event,
            WebhookEvent::CheckoutSessionCompleted { .. }
        ));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("deadbeef", "deadbeef"));
        assert!(!constant_time_compare("deadbeef", "deadbeee"));
        assert!(!constant_time_compare("dead", "deadbeef"));
    }
}
