use std::net::SocketAddr;
use std::sync::Arc;

use dukkan_api::{app, AppState};
use dukkan_core::payment::WebhookVerifier;
use dukkan_order::{CheckoutOrchestrator, CheckoutPolicy};
use dukkan_store::{DbClient, PgCatalogRepository, PgOrderLedger, SessionStore, ThawaniClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dukkan_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = dukkan_store::app_config::Config::load()?;
    tracing::info!("Starting dukkan API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    let sessions = Arc::new(SessionStore::new(&config.redis.url)?);

    let gateway = Arc::new(ThawaniClient::new(config.thawani.clone())?);
    let catalog = Arc::new(PgCatalogRepository::new(db.pool.clone()));
    let ledger = Arc::new(PgOrderLedger::new(db.pool.clone()));

    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        gateway,
        ledger.clone(),
        CheckoutPolicy {
            assume_success_on_ambiguous_return: config.thawani.assume_success_on_ambiguous_return,
        },
    ));

    let state = AppState {
        catalog,
        ledger,
        sessions,
        orchestrator,
        webhook_verifier: Arc::new(WebhookVerifier::new(config.thawani.webhook_secret.clone())),
        delivery: config.business_rules.delivery_policy(),
        currency: config.business_rules.currency.clone(),
        public_base_url: config.server.public_base_url.clone(),
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
