use dukkan_cart::PricedCart;
use dukkan_core::payment::{
    is_synthetic_session, GatewayError, PaymentGateway, PaymentStatus, PayloadProduct,
    SessionRequest,
};
use dukkan_shared::money::minor_units;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::checkout::{CheckoutAttempt, CheckoutState, CustomerDetails};
use crate::models::{mint_order_id, NewOrder, NewOrderItem, OrderStatus};
use crate::repository::OrderRepository;

/// Success/cancel landing URLs handed to the gateway for one attempt.
#[derive(Debug, Clone)]
pub struct ReturnUrls {
    pub success_url: String,
    pub cancel_url: String,
}

/// Knobs that change what the orchestrator does on ambiguous input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPolicy {
    /// When the customer lands on the success route with no resolvable
    /// session id but a non-empty cart, record the order anyway. Fabricating
    /// paid orders is a business-risk decision, so it is off by default and
    /// must be switched on deliberately.
    pub assume_success_on_ambiguous_return: bool,
}

impl Default for CheckoutPolicy {
    fn default() -> Self {
        Self {
            assume_success_on_ambiguous_return: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("cart has no purchasable lines")]
    EmptyCart,

    #[error("no checkout session could be resolved for this return")]
    AmbiguousReturn,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("order ledger error: {0}")]
    Ledger(Box<dyn std::error::Error + Send + Sync>),
}

/// Outcome of a finalize trigger (browser redirect or webhook delivery).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// A new ledger row was written.
    Recorded { order_id: String },
    /// Another trigger got there first; nothing written.
    AlreadyRecorded { order_id: String },
    /// Payment did not complete; nothing written.
    Cancelled,
}

/// Drives cart -> gateway session -> order confirmation.
pub struct CheckoutOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn OrderRepository>,
    policy: CheckoutPolicy,
    payment_method: String,
}

impl CheckoutOrchestrator {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn OrderRepository>,
        policy: CheckoutPolicy,
    ) -> Self {
        Self {
            gateway,
            ledger,
            policy,
            payment_method: "Thawani Pay".to_string(),
        }
    }

    /// Start a checkout attempt: mint an order id, open a gateway session,
    /// hand back the attempt with the customer redirect URL.
    pub async fn begin(
        &self,
        priced: &PricedCart,
        customer: CustomerDetails,
        urls: &ReturnUrls,
    ) -> Result<CheckoutAttempt, CheckoutError> {
        if priced.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order_id = mint_order_id();
        let request = build_session_request(priced, &order_id, &customer, urls);
        let mut attempt = CheckoutAttempt::new(order_id, customer);

        match self.gateway.create_session(&request).await {
            Ok(session) => {
                tracing::info!(
                    order_id = %attempt.order_id,
                    session_id = %session.session_id,
                    synthetic = session.synthetic,
                    "checkout session ready"
                );
                attempt.gateway_session_id = Some(session.session_id);
                attempt.checkout_url = Some(session.checkout_url);
                attempt.state = CheckoutState::SessionReady;
                Ok(attempt)
            }
            Err(err) => {
                tracing::warn!(order_id = %attempt.order_id, error = %err, "checkout session failed");
                attempt.state = CheckoutState::SessionFailed;
                Err(err.into())
            }
        }
    }

    /// Finalize after the customer returns from the gateway.
    ///
    /// The session id is taken from the return request when present, falling
    /// back to the one stored on the attempt. With neither available the
    /// outcome is governed by `assume_success_on_ambiguous_return`.
    pub async fn finalize_on_return(
        &self,
        attempt: &mut CheckoutAttempt,
        session_id_hint: Option<&str>,
        priced: &PricedCart,
    ) -> Result<FinalizeOutcome, CheckoutError> {
        let session_id = session_id_hint
            .map(str::to_string)
            .or_else(|| attempt.gateway_session_id.clone());

        let Some(session_id) = session_id else {
            if self.policy.assume_success_on_ambiguous_return && !priced.is_empty() {
                tracing::warn!(
                    order_id = %attempt.order_id,
                    "no session id on return; recording order per policy"
                );
                return self.record_order(attempt, priced).await;
            }
            return Err(CheckoutError::AmbiguousReturn);
        };

        let status = if is_synthetic_session(&session_id) {
            PaymentStatus::Paid
        } else {
            self.gateway.session_status(&session_id).await?
        };

        match status {
            PaymentStatus::Paid => self.record_order(attempt, priced).await,
            PaymentStatus::Created | PaymentStatus::Failed | PaymentStatus::Cancelled => {
                tracing::info!(
                    order_id = %attempt.order_id,
                    ?status,
                    "return without completed payment"
                );
                attempt.state = CheckoutState::Cancelled;
                Ok(FinalizeOutcome::Cancelled)
            }
        }
    }

    /// Write the order exactly once.
    ///
    /// Guarded three ways: the attempt's `order_recorded` flag, a ledger
    /// existence check, and the unique constraint behind
    /// `OrderRepository::insert_order`. Webhook and redirect can race here;
    /// the constraint decides the winner.
    async fn record_order(
        &self,
        attempt: &mut CheckoutAttempt,
        priced: &PricedCart,
    ) -> Result<FinalizeOutcome, CheckoutError> {
        if attempt.order_recorded {
            return Ok(FinalizeOutcome::AlreadyRecorded {
                order_id: attempt.order_id.clone(),
            });
        }
        if self
            .ledger
            .get_by_order_id(&attempt.order_id)
            .await
            .map_err(CheckoutError::Ledger)?
            .is_some()
        {
            attempt.order_recorded = true;
            attempt.state = CheckoutState::OrderRecorded;
            return Ok(FinalizeOutcome::AlreadyRecorded {
                order_id: attempt.order_id.clone(),
            });
        }

        let order = NewOrder {
            order_id: attempt.order_id.clone(),
            customer_name: attempt.customer.name_or_default(),
            customer_email: attempt.customer.email_or_default(),
            customer_phone: attempt.customer.phone_or_default(),
            address: attempt.customer.address.clone().unwrap_or_default(),
            city: attempt.customer.city.clone().unwrap_or_default(),
            postal_code: attempt.customer.postal_code.clone().unwrap_or_default(),
            total_amount: priced.total,
            delivery_fee: priced.delivery_fee,
            payment_method: self.payment_method.clone(),
            items: priced
                .lines
                .iter()
                .map(|line| NewOrderItem {
                    product_name: line.name.clone(),
                    product_id: Some(line.product_id),
                    quantity: line.quantity,
                    price: line.unit_price,
                })
                .collect(),
        };

        let inserted = self
            .ledger
            .insert_order(&order)
            .await
            .map_err(CheckoutError::Ledger)?;

        attempt.order_recorded = true;
        attempt.state = CheckoutState::OrderRecorded;

        if inserted {
            tracing::info!(order_id = %order.order_id, "order recorded");
            Ok(FinalizeOutcome::Recorded {
                order_id: order.order_id,
            })
        } else {
            Ok(FinalizeOutcome::AlreadyRecorded {
                order_id: order.order_id,
            })
        }
    }

    /// Apply a verified webhook event to the ledger. Unknown event types and
    /// unknown order ids are acknowledged and ignored.
    pub async fn apply_webhook_event(
        &self,
        event_type: &str,
        reference: &str,
    ) -> Result<Option<OrderStatus>, CheckoutError> {
        let status = match event_type {
            "checkout.completed" | "payment.succeeded" => OrderStatus::Paid,
            "payment.failed" => OrderStatus::Failed,
            _ => {
                tracing::debug!(event_type, "ignoring unrecognized webhook event");
                return Ok(None);
            }
        };

        let updated = self
            .ledger
            .update_status(reference, status)
            .await
            .map_err(CheckoutError::Ledger)?;
        if updated {
            tracing::info!(order_id = %reference, ?status, "order status updated via webhook");
            Ok(Some(status))
        } else {
            tracing::debug!(order_id = %reference, "webhook references unknown order");
            Ok(None)
        }
    }
}

/// Build the provider payload from a priced cart. Amounts are converted to
/// minor units here and nowhere else.
pub fn build_session_request(
    priced: &PricedCart,
    order_id: &str,
    customer: &CustomerDetails,
    urls: &ReturnUrls,
) -> SessionRequest {
    let mut products: Vec<PayloadProduct> = priced
        .lines
        .iter()
        .map(|line| PayloadProduct {
            name: line.name.clone(),
            unit_amount: minor_units(line.unit_price),
            quantity: line.quantity,
        })
        .collect();
    if !priced.delivery_fee.is_zero() {
        products.push(PayloadProduct {
            name: "Delivery".to_string(),
            unit_amount: minor_units(priced.delivery_fee),
            quantity: 1,
        });
    }

    SessionRequest {
        client_reference_id: order_id.to_string(),
        products,
        total_amount: minor_units(priced.total),
        currency: priced.currency.clone(),
        success_url: urls.success_url.clone(),
        cancel_url: urls.cancel_url.clone(),
        metadata: serde_json::json!({
            "Customer name": customer.name_or_default(),
            "Contact number": customer.phone_or_default(),
            "Email address": customer.email_or_default(),
            "order_id": order_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryOrderLedger;
    use async_trait::async_trait;
    use dukkan_cart::LineItemSnapshot;
    use dukkan_catalog::LineItemKey;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Gateway double with a fixed status and a call counter.
    struct StubGateway {
        status: PaymentStatus,
        synthetic: bool,
        status_calls: AtomicUsize,
    }

    impl StubGateway {
        fn paid() -> Self {
            Self {
                status: PaymentStatus::Paid,
                synthetic: false,
                status_calls: AtomicUsize::new(0),
            }
        }

        fn cancelled() -> Self {
            Self {
                status: PaymentStatus::Cancelled,
                synthetic: false,
                status_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_session(
            &self,
            request: &SessionRequest,
        ) -> Result<dukkan_core::payment::GatewaySession, GatewayError> {
            let session_id = if self.synthetic {
                format!("MOCK_{}", request.client_reference_id)
            } else {
                format!("checkout_{}", request.client_reference_id)
            };
            Ok(dukkan_core::payment::GatewaySession {
                checkout_url: format!("https://uatcheckout.example.om/pay/{}", session_id),
                session_id,
                synthetic: self.synthetic,
            })
        }

        async fn session_status(&self, _session_id: &str) -> Result<PaymentStatus, GatewayError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.status)
        }
    }

    fn priced_cart() -> PricedCart {
        // Two lines: 3.00 x1 and 2.00 x1, free delivery for the payload test.
        PricedCart {
            lines: vec![
                LineItemSnapshot {
                    key: LineItemKey::Simple(1),
                    product_id: 1,
                    name: "Desk Lamp".to_string(),
                    unit_price: Decimal::new(300, 2),
                    quantity: 1,
                    line_total: Decimal::new(300, 2),
                },
                LineItemSnapshot {
                    key: LineItemKey::Simple(2),
                    product_id: 2,
                    name: "Mug".to_string(),
                    unit_price: Decimal::new(200, 2),
                    quantity: 1,
                    line_total: Decimal::new(200, 2),
                },
            ],
            subtotal: Decimal::new(500, 2),
            delivery_fee: Decimal::ZERO,
            total: Decimal::new(500, 2),
            currency: "OMR".to_string(),
        }
    }

    fn urls() -> ReturnUrls {
        ReturnUrls {
            success_url: "https://shop.example.om/v1/checkout/s1/return".to_string(),
            cancel_url: "https://shop.example.om/v1/checkout/s1/cancel".to_string(),
        }
    }

    #[test]
    fn test_payload_amounts_are_minor_units() {
        let request = build_session_request(
            &priced_cart(),
            "THWTEST0001",
            &CustomerDetails::default(),
            &urls(),
        );
        assert_eq!(request.total_amount, 500);
        assert_eq!(request.line_total(), 500);
        assert_eq!(request.currency, "OMR");
        assert_eq!(request.client_reference_id, "THWTEST0001");
    }

    #[test]
    fn test_payload_includes_delivery_line() {
        let mut priced = priced_cart();
        priced.delivery_fee = Decimal::new(200, 2);
        priced.total = Decimal::new(700, 2);

        let request =
            build_session_request(&priced, "THWTEST0002", &CustomerDetails::default(), &urls());
        assert_eq!(request.total_amount, 700);
        assert_eq!(request.line_total(), 700);
        assert_eq!(request.products.last().unwrap().name, "Delivery");
    }

    #[tokio::test]
    async fn test_begin_requires_purchasable_lines() {
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(StubGateway::paid()),
            ledger,
            CheckoutPolicy::default(),
        );
        let empty = PricedCart {
            lines: vec![],
            subtotal: Decimal::ZERO,
            delivery_fee: Decimal::ZERO,
            total: Decimal::ZERO,
            currency: "OMR".to_string(),
        };
        let err = orchestrator
            .begin(&empty, CustomerDetails::default(), &urls())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_finalize_twice_records_one_order() {
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(StubGateway::paid()),
            ledger.clone(),
            CheckoutPolicy::default(),
        );
        let priced = priced_cart();
        let mut attempt = orchestrator
            .begin(&priced, CustomerDetails::default(), &urls())
            .await
            .unwrap();

        let first = orchestrator
            .finalize_on_return(&mut attempt, None, &priced)
            .await
            .unwrap();
        assert!(matches!(first, FinalizeOutcome::Recorded { .. }));

        // Browser refresh on the success page.
        let second = orchestrator
            .finalize_on_return(&mut attempt, None, &priced)
            .await
            .unwrap();
        assert!(matches!(second, FinalizeOutcome::AlreadyRecorded { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_finalize_via_fresh_attempt_still_inserts_once() {
        // Same order id reached through two attempt copies, as when the
        // webhook and redirect paths deserialize the attempt independently.
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(StubGateway::paid()),
            ledger.clone(),
            CheckoutPolicy::default(),
        );
        let priced = priced_cart();
        let attempt = orchestrator
            .begin(&priced, CustomerDetails::default(), &urls())
            .await
            .unwrap();

        let mut copy_a = attempt.clone();
        let mut copy_b = attempt.clone();
        orchestrator
            .finalize_on_return(&mut copy_a, None, &priced)
            .await
            .unwrap();
        let outcome = orchestrator
            .finalize_on_return(&mut copy_b, None, &priced)
            .await
            .unwrap();
        assert!(matches!(outcome, FinalizeOutcome::AlreadyRecorded { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_unpaid_return_records_nothing() {
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(StubGateway::cancelled()),
            ledger.clone(),
            CheckoutPolicy::default(),
        );
        let priced = priced_cart();
        let mut attempt = orchestrator
            .begin(&priced, CustomerDetails::default(), &urls())
            .await
            .unwrap();

        let outcome = orchestrator
            .finalize_on_return(&mut attempt, None, &priced)
            .await
            .unwrap();
        assert_eq!(outcome, FinalizeOutcome::Cancelled);
        assert!(ledger.is_empty());
        assert_eq!(attempt.state, CheckoutState::Cancelled);
    }

    #[tokio::test]
    async fn test_ambiguous_return_rejected_by_default() {
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(StubGateway::paid()),
            ledger.clone(),
            CheckoutPolicy::default(),
        );
        let priced = priced_cart();
        let mut attempt = CheckoutAttempt::new("THWAMBIG001".to_string(), CustomerDetails::default());

        let err = orchestrator
            .finalize_on_return(&mut attempt, None, &priced)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::AmbiguousReturn));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_ambiguous_return_records_when_policy_enabled() {
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(StubGateway::paid()),
            ledger.clone(),
            CheckoutPolicy {
                assume_success_on_ambiguous_return: true,
            },
        );
        let priced = priced_cart();
        let mut attempt = CheckoutAttempt::new("THWAMBIG002".to_string(), CustomerDetails::default());

        let outcome = orchestrator
            .finalize_on_return(&mut attempt, None, &priced)
            .await
            .unwrap();
        assert!(matches!(outcome, FinalizeOutcome::Recorded { .. }));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_synthetic_session_skips_status_call() {
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let gateway = Arc::new(StubGateway::cancelled());
        let orchestrator =
            CheckoutOrchestrator::new(gateway.clone(), ledger.clone(), CheckoutPolicy::default());
        let priced = priced_cart();
        let mut attempt = CheckoutAttempt::new("THWMOCK0001".to_string(), CustomerDetails::default());

        // Even with a gateway that would answer "cancelled", a synthetic
        // session finalizes as paid without asking it.
        let outcome = orchestrator
            .finalize_on_return(&mut attempt, Some("MOCK_AB12CD34EF56GH78"), &priced)
            .await
            .unwrap();
        assert!(matches!(outcome, FinalizeOutcome::Recorded { .. }));
        assert_eq!(gateway.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_webhook_events_map_to_statuses() {
        let ledger = Arc::new(InMemoryOrderLedger::new());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(StubGateway::paid()),
            ledger.clone(),
            CheckoutPolicy::default(),
        );
        let priced = priced_cart();
        let mut attempt = orchestrator
            .begin(&priced, CustomerDetails::default(), &urls())
            .await
            .unwrap();
        orchestrator
            .finalize_on_return(&mut attempt, None, &priced)
            .await
            .unwrap();
        let order_id = attempt.order_id.clone();

        let status = orchestrator
            .apply_webhook_event("checkout.completed", &order_id)
            .await
            .unwrap();
        assert_eq!(status, Some(OrderStatus::Paid));

        assert_eq!(
            orchestrator
                .apply_webhook_event("payment.failed", "THWUNKNOWN1")
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            orchestrator
                .apply_webhook_event("customer.updated", &order_id)
                .await
                .unwrap(),
            None
        );
    }
}
