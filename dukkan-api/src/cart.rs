use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use dukkan_cart::{price_cart, PricedCart};
use dukkan_catalog::LineItemKey;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cart/{session}", get(get_cart))
        .route("/v1/cart/{session}", delete(clear_cart))
        .route("/v1/cart/{session}/items", post(add_item))
        .route("/v1/cart/{session}/items/{key}", put(update_item))
        .route("/v1/cart/{session}/items/{key}", delete(remove_item))
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    #[serde(flatten)]
    pub priced: PricedCart,
    pub cart_quantity: u32,
}

async fn priced_response(state: &AppState, session: &str) -> Result<CartResponse, AppError> {
    let cart = state.sessions.load_cart(session).await?;
    let priced = price_cart(
        state.catalog.as_ref(),
        &cart,
        &state.delivery,
        &state.currency,
    )
    .await?;
    Ok(CartResponse {
        priced,
        cart_quantity: cart.total_quantity(),
    })
}

/// GET /v1/cart/{session}
/// Priced snapshot of the session's cart. Lines whose product has
/// disappeared from the catalog are omitted.
pub async fn get_cart(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<CartResponse>, AppError> {
    Ok(Json(priced_response(&state, &session).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Option<i64>,
    pub variant_id: Option<i64>,
    pub size_id: Option<i64>,
    pub quantity: Option<u32>,
}

impl AddItemRequest {
    /// Decode the request into a line-item key, once. Handlers and storage
    /// only ever see the typed key after this point.
    fn line_item_key(&self) -> Result<LineItemKey, AppError> {
        match (self.product_id, self.variant_id, self.size_id) {
            (Some(product_id), None, None) => Ok(LineItemKey::Simple(product_id)),
            (None, Some(variant_id), Some(size_id)) => Ok(LineItemKey::Variant {
                variant_id,
                size_id,
            }),
            _ => Err(AppError::BadRequest(
                "provide either product_id or variant_id with size_id".to_string(),
            )),
        }
    }
}

/// POST /v1/cart/{session}/items
pub async fn add_item(
    State(state): State<AppState>,
    Path(session): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let key = request.line_item_key()?;
    let quantity = request.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be positive".to_string()));
    }

    let mut cart = state.sessions.load_cart(&session).await?;
    cart.add(key, quantity);
    state.sessions.save_cart(&session, &cart).await?;

    Ok(Json(priced_response(&state, &session).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// PUT /v1/cart/{session}/items/{key}
/// Zero quantity removes the line.
pub async fn update_item(
    State(state): State<AppState>,
    Path((session, key)): Path<(String, String)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>, AppError> {
    let key: LineItemKey = key
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid cart key: {}", key)))?;

    let mut cart = state.sessions.load_cart(&session).await?;
    cart.set_quantity(key, request.quantity);
    state.sessions.save_cart(&session, &cart).await?;

    Ok(Json(priced_response(&state, &session).await?))
}

/// DELETE /v1/cart/{session}/items/{key}
pub async fn remove_item(
    State(state): State<AppState>,
    Path((session, key)): Path<(String, String)>,
) -> Result<Json<CartResponse>, AppError> {
    let key: LineItemKey = key
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid cart key: {}", key)))?;

    let mut cart = state.sessions.load_cart(&session).await?;
    cart.remove(&key);
    state.sessions.save_cart(&session, &cart).await?;

    Ok(Json(priced_response(&state, &session).await?))
}

#[derive(Debug, Serialize)]
pub struct ClearCartResponse {
    pub success: bool,
    pub message: String,
}

/// DELETE /v1/cart/{session}
/// Drops the cart and any in-flight checkout attempt for the session.
pub async fn clear_cart(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<Json<ClearCartResponse>, AppError> {
    state.sessions.clear_cart(&session).await?;
    state.sessions.clear_attempt(&session).await?;
    Ok(Json(ClearCartResponse {
        success: true,
        message: "Cart cleared".to_string(),
    }))
}
