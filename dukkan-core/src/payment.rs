use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Identifier prefix reserved for locally fabricated sessions. Status checks
/// short-circuit on it instead of contacting the provider.
pub const SYNTHETIC_SESSION_PREFIX: &str = "MOCK_";

pub fn is_synthetic_session(session_id: &str) -> bool {
    session_id.starts_with(SYNTHETIC_SESSION_PREFIX)
}

/// Hosted checkout session status as reported by the provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Created)
    }
}

/// One product line in the provider payload, amounts in minor units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadProduct {
    pub name: String,
    pub unit_amount: i64,
    pub quantity: u32,
}

/// Everything the provider needs to open a hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub client_reference_id: String,
    pub products: Vec<PayloadProduct>,
    pub total_amount: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: serde_json::Value,
}

impl SessionRequest {
    /// Sum of per-line amounts. Must match `total_amount` at construction.
    pub fn line_total(&self) -> i64 {
        self.products
            .iter()
            .map(|p| p.unit_amount * i64::from(p.quantity))
            .sum()
    }
}

/// Provider-side session handle returned by session creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySession {
    pub session_id: String,
    pub checkout_url: String,
    /// Locally fabricated because the provider was unreachable.
    pub synthetic: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("payment provider unreachable: all endpoints failed after retries")]
    Unavailable,

    #[error("payment provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("unexpected provider response shape: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Contract for the hosted-checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout session and return the customer redirect URL.
    async fn create_session(&self, request: &SessionRequest) -> Result<GatewaySession, GatewayError>;

    /// Current status of a previously created session. Synthetic sessions
    /// resolve without a network call.
    async fn session_status(&self, session_id: &str) -> Result<PaymentStatus, GatewayError>;
}

/// Uniform retry schedule applied across the ordered endpoint list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff before retry attempt `attempt` (zero-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

/// Verifies inbound webhook authenticity.
///
/// The provider signs `body + "-" + timestamp` with HMAC-SHA256 over the
/// shared webhook secret and sends the hex digest in a header.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn verify(&self, body: &[u8], timestamp: &str, signature: &str) -> bool {
        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(body);
        mac.update(b"-");
        mac.update(timestamp.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        // Signature length is fixed for SHA-256, not secret.
        if expected.len() != signature.len() {
            return false;
        }
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8], timestamp: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        mac.update(b"-");
        mac.update(timestamp.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let verifier = WebhookVerifier::new("whsec_test");
        let body = br#"{"event_type":"checkout.completed"}"#;
        let ts = "1722470400";
        let sig = sign("whsec_test", body, ts);
        assert!(verifier.verify(body, ts, &sig));
    }

    #[test]
    fn test_mutated_body_rejected() {
        let verifier = WebhookVerifier::new("whsec_test");
        let body = br#"{"event_type":"checkout.completed"}"#;
        let ts = "1722470400";
        let sig = sign("whsec_test", body, ts);
        let tampered = br#"{"event_type":"checkout.completed!"}"#;
        assert!(!verifier.verify(tampered, ts, &sig));
    }

    #[test]
    fn test_mutated_timestamp_rejected() {
        let verifier = WebhookVerifier::new("whsec_test");
        let body = br#"{"event_type":"payment.succeeded"}"#;
        let sig = sign("whsec_test", body, "1722470400");
        assert!(!verifier.verify(body, "1722470401", &sig));
    }

    #[test]
    fn test_mutated_signature_rejected() {
        let verifier = WebhookVerifier::new("whsec_test");
        let body = br#"{"event_type":"payment.succeeded"}"#;
        let ts = "1722470400";
        let mut sig = sign("whsec_test", body, ts);
        // Flip one hex digit.
        let last = sig.pop().unwrap();
        sig.push(if last == '0' { '1' } else { '0' });
        assert!(!verifier.verify(body, ts, &sig));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let verifier = WebhookVerifier::new("whsec_test");
        let body = br#"{}"#;
        let ts = "1722470400";
        let sig = sign("other_secret", body, ts);
        assert!(!verifier.verify(body, ts, &sig));
    }

    #[test]
    fn test_synthetic_session_prefix() {
        assert!(is_synthetic_session("MOCK_AB12CD34EF56GH78"));
        assert!(!is_synthetic_session("checkout_ab12cd34"));
    }

    #[test]
    fn test_backoff_schedule_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff(1), Duration::from_millis(2000));
        assert_eq!(policy.backoff(2), Duration::from_millis(4000));
    }
}
