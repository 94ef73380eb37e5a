use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use dukkan_core::payment::GatewayError;
use dukkan_order::CheckoutError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("Internal error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for AppError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        AppError::Internal(err)
    }
}

/// Customer-facing wording for gateway failures. Every branch resolves to a
/// JSON error payload; raw provider errors never reach the customer.
fn gateway_message(err: &GatewayError) -> (StatusCode, String) {
    match err {
        GatewayError::Unavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Payment service is temporarily unavailable. Please try again in a few minutes."
                .to_string(),
        ),
        GatewayError::Transport(_) => (
            StatusCode::BAD_GATEWAY,
            "Cannot connect to payment service. Please try again.".to_string(),
        ),
        GatewayError::Api { .. } => (
            StatusCode::BAD_GATEWAY,
            "Payment service temporarily unavailable. Please try again in a few minutes."
                .to_string(),
        ),
        GatewayError::MalformedResponse(_) => (
            StatusCode::BAD_GATEWAY,
            "Payment service returned an unexpected response. Please try again.".to_string(),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Gateway(err) => {
                tracing::error!("Gateway error: {}", err);
                gateway_message(err)
            }
            AppError::Checkout(CheckoutError::EmptyCart) => {
                (StatusCode::BAD_REQUEST, "Cart is empty".to_string())
            }
            AppError::Checkout(CheckoutError::AmbiguousReturn) => (
                StatusCode::BAD_REQUEST,
                "Unable to verify payment for this return".to_string(),
            ),
            AppError::Checkout(CheckoutError::Gateway(err)) => {
                tracing::error!("Gateway error: {}", err);
                gateway_message(err)
            }
            AppError::Checkout(CheckoutError::Ledger(err)) => {
                tracing::error!("Ledger error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Internal(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
