use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use dukkan_order::{Order, OrderStatus};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", get(list_orders))
        .route("/v1/orders/{order_id}", get(get_order))
        .route("/v1/orders/{order_id}/status", put(update_order_status))
}

/// GET /v1/orders/{order_id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<Order>, AppError> {
    state
        .ledger
        .get_by_order_id(&order_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub email: String,
}

/// GET /v1/orders?email=
/// Recent orders for a customer, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.ledger.list_for_email(&params.email).await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /v1/orders/{order_id}/status
/// Admin-side lifecycle transitions (Paid -> Shipped -> Delivered).
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let next = OrderStatus::parse(&request.status)
        .ok_or_else(|| AppError::BadRequest(format!("unknown status: {}", request.status)))?;

    let order = state
        .ledger
        .get_by_order_id(&order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))?;

    if !order.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "cannot move order from {} to {}",
            order.status.as_str(),
            next.as_str()
        )));
    }

    state.ledger.update_status(&order_id, next).await?;
    let updated = state
        .ledger
        .get_by_order_id(&order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))?;
    Ok(Json(updated))
}
