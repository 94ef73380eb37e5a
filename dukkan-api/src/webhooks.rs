use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/webhooks/thawani", post(handle_thawani_webhook))
}

const TIMESTAMP_HEADER: &str = "thawani-timestamp";
const SIGNATURE_HEADER: &str = "thawani-signature";

#[derive(Debug, Deserialize)]
pub struct ThawaniWebhookEvent {
    pub event_type: String,
    #[serde(default)]
    pub data: ThawaniEventData,
}

#[derive(Debug, Deserialize, Default)]
pub struct ThawaniEventData {
    /// Reference carried by `checkout.completed`.
    pub client_reference_id: Option<String>,
    /// Reference carried by `payment.succeeded` / `payment.failed`.
    pub checkout_invoice: Option<String>,
}

impl ThawaniWebhookEvent {
    fn order_reference(&self) -> Option<&str> {
        match self.event_type.as_str() {
            "checkout.completed" => self.data.client_reference_id.as_deref(),
            "payment.succeeded" | "payment.failed" => self.data.checkout_invoice.as_deref(),
            _ => None,
        }
    }
}

/// POST /v1/webhooks/thawani
/// Receive payment status updates from the provider.
///
/// Signature is verified before anything is parsed; a bad or missing
/// signature mutates no state.
pub async fn handle_thawani_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok());
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return Err(reject("Missing webhook headers"));
    };

    if !state.webhook_verifier.verify(&body, timestamp, signature) {
        tracing::warn!("rejected webhook with invalid signature");
        return Err(reject("Invalid webhook signature"));
    }

    let event: ThawaniWebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| reject(&format!("Invalid webhook body: {}", err)))?;

    tracing::info!(event_type = %event.event_type, "received webhook");

    if let Some(reference) = event.order_reference() {
        state
            .orchestrator
            .apply_webhook_event(&event.event_type, reference)
            .await
            .map_err(|err| {
                tracing::error!("webhook processing failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Webhook processing error" })),
                )
            })?;
    }

    Ok(Json(json!({ "success": true })))
}

fn reject(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}
