use std::sync::Arc;

use dukkan_cart::DeliveryPolicy;
use dukkan_catalog::CatalogRepository;
use dukkan_core::payment::WebhookVerifier;
use dukkan_order::{CheckoutOrchestrator, OrderRepository};
use dukkan_store::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogRepository>,
    pub ledger: Arc<dyn OrderRepository>,
    pub sessions: Arc<SessionStore>,
    pub orchestrator: Arc<CheckoutOrchestrator>,
    pub webhook_verifier: Arc<WebhookVerifier>,
    pub delivery: DeliveryPolicy,
    pub currency: String,
    /// Externally visible base URL for building gateway return URLs.
    pub public_base_url: String,
}
