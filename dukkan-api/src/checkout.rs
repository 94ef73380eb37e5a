use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use dukkan_cart::price_cart;
use dukkan_order::{
    CheckoutAttempt, CheckoutState, CustomerDetails, FinalizeOutcome, Order, ReturnUrls,
};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/checkout/{session}", post(create_checkout))
        .route("/v1/checkout/{session}/return", get(checkout_return))
        .route("/v1/checkout/{session}/cancel", get(checkout_cancel))
}

#[derive(Debug, Deserialize, Default)]
pub struct CheckoutRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: String,
    pub session_id: String,
    pub checkout_url: String,
}

fn return_urls(state: &AppState, session: &str) -> ReturnUrls {
    ReturnUrls {
        success_url: format!("{}/v1/checkout/{}/return", state.public_base_url, session),
        cancel_url: format!("{}/v1/checkout/{}/cancel", state.public_base_url, session),
    }
}

/// POST /v1/checkout/{session}
/// Price the cart, open a gateway session, hand back the redirect URL.
pub async fn create_checkout(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let cart = state.sessions.load_cart(&session).await?;
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }

    let priced = price_cart(
        state.catalog.as_ref(),
        &cart,
        &state.delivery,
        &state.currency,
    )
    .await?;
    if priced.is_empty() {
        return Err(AppError::BadRequest("No valid items in cart".to_string()));
    }

    let customer = CustomerDetails {
        name: request.name,
        email: request.email,
        phone: request.phone,
        address: request.address,
        city: request.city,
        postal_code: request.postal_code,
    };

    let attempt = state
        .orchestrator
        .begin(&priced, customer, &return_urls(&state, &session))
        .await?;
    state.sessions.save_attempt(&session, &attempt).await?;

    let session_id = attempt.gateway_session_id.clone().unwrap_or_default();
    let checkout_url = attempt.checkout_url.clone().unwrap_or_default();
    Ok(Json(CheckoutResponse {
        order_id: attempt.order_id,
        session_id,
        checkout_url,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReturnParams {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
}

/// GET /v1/checkout/{session}/return
///
/// Landing route after the hosted checkout. May run more than once for the
/// same order (refresh, back button, webhook racing ahead); the orchestrator
/// guarantees a single ledger row either way.
pub async fn checkout_return(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Query(params): Query<ReturnParams>,
) -> Result<Json<ConfirmationResponse>, AppError> {
    let cart = state.sessions.load_cart(&session).await?;
    let priced = price_cart(
        state.catalog.as_ref(),
        &cart,
        &state.delivery,
        &state.currency,
    )
    .await?;

    // A lost attempt (expired session state) still gets a fresh context so
    // the ambiguous-return policy can decide what happens.
    let mut attempt = match state.sessions.load_attempt(&session).await? {
        Some(attempt) => attempt,
        None => CheckoutAttempt::new(dukkan_order::mint_order_id(), CustomerDetails::default()),
    };

    let outcome = state
        .orchestrator
        .finalize_on_return(&mut attempt, params.session_id.as_deref(), &priced)
        .await?;
    state.sessions.save_attempt(&session, &attempt).await?;

    match outcome {
        FinalizeOutcome::Recorded { order_id } | FinalizeOutcome::AlreadyRecorded { order_id } => {
            // Order is in; the cart's job is done.
            state.sessions.clear_cart(&session).await?;
            let order = state.ledger.get_by_order_id(&order_id).await?;
            Ok(Json(ConfirmationResponse {
                success: true,
                message: "Payment successful! Your order has been placed.".to_string(),
                order,
            }))
        }
        FinalizeOutcome::Cancelled => Ok(Json(ConfirmationResponse {
            success: false,
            message: "Payment was not completed. You can try again.".to_string(),
            order: None,
        })),
    }
}

/// GET /v1/checkout/{session}/cancel
pub async fn checkout_cancel(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<ConfirmationResponse>, AppError> {
    if let Some(mut attempt) = state.sessions.load_attempt(&session).await? {
        attempt.state = CheckoutState::Cancelled;
        state.sessions.save_attempt(&session, &attempt).await?;
    }
    Ok(Json(ConfirmationResponse {
        success: false,
        message: "Payment was cancelled. You can try again.".to_string(),
        order: None,
    }))
}
