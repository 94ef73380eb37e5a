use serde::{Deserialize, Serialize};

/// Where a checkout attempt stands. One attempt per customer session at a
/// time; the attempt is persisted under the session key and reloaded when
/// the customer comes back from the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutState {
    /// Session creation has been requested from the gateway.
    SessionRequested,
    /// The gateway handed back a redirect URL; the customer is (probably)
    /// on the hosted checkout page.
    SessionReady,
    /// The gateway could not produce a session.
    SessionFailed,
    /// The order has been written to the ledger.
    OrderRecorded,
    /// The customer came back unpaid or cancelled.
    Cancelled,
}

/// Customer contact and delivery details captured on the checkout form.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl CustomerDetails {
    pub fn name_or_default(&self) -> String {
        self.name.clone().unwrap_or_else(|| "Guest".to_string())
    }

    pub fn email_or_default(&self) -> String {
        self.email
            .clone()
            .unwrap_or_else(|| "guest@example.com".to_string())
    }

    pub fn phone_or_default(&self) -> String {
        self.phone.clone().unwrap_or_else(|| "+96800000000".to_string())
    }
}

/// Typed context for one checkout attempt. Replaces what used to be loose
/// keys scattered across the session: every step reads and writes this one
/// struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutAttempt {
    pub order_id: String,
    pub gateway_session_id: Option<String>,
    pub checkout_url: Option<String>,
    pub customer: CustomerDetails,
    pub state: CheckoutState,
    /// Idempotency flag: set once the order row is written, checked before
    /// any further finalize attempt inserts again.
    pub order_recorded: bool,
}

impl CheckoutAttempt {
    pub fn new(order_id: String, customer: CustomerDetails) -> Self {
        Self {
            order_id,
            gateway_session_id: None,
            checkout_url: None,
            customer,
            state: CheckoutState::SessionRequested,
            order_recorded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_attempt_starts_unrecorded() {
        let attempt = CheckoutAttempt::new("THWAAAA1111".to_string(), CustomerDetails::default());
        assert_eq!(attempt.state, CheckoutState::SessionRequested);
        assert!(!attempt.order_recorded);
        assert!(attempt.gateway_session_id.is_none());
    }

    #[test]
    fn test_customer_fallbacks() {
        let customer = CustomerDetails::default();
        assert_eq!(customer.name_or_default(), "Guest");
        assert_eq!(customer.email_or_default(), "guest@example.com");
        assert_eq!(customer.phone_or_default(), "+96800000000");
    }
}
