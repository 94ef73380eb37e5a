use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use dukkan_catalog::{Category, Product};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/products", get(list_products))
        .route("/v1/products/search", get(search_products))
        .route("/v1/products/{id}", get(get_product))
        .route("/v1/categories", get(list_categories))
        .route("/v1/categories/{id}/products", get(products_in_category))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub page: u32,
}

/// GET /v1/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductListResponse>, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let products = state
        .catalog
        .list_products(i64::from(per_page), offset)
        .await?;
    Ok(Json(ProductListResponse { products, page }))
}

/// GET /v1/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Product>, AppError> {
    state
        .catalog
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {} not found", id)))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

/// GET /v1/products/search?q=
pub async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    if params.q.trim().is_empty() {
        return Ok(Json(vec![]));
    }
    let products = state.catalog.search_products(params.q.trim()).await?;
    Ok(Json(products))
}

/// GET /v1/categories
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.catalog.list_categories().await?;
    Ok(Json(categories))
}

/// GET /v1/categories/{id}/products
///
/// Includes products from the category's direct subcategories, so browsing
/// a top-level category shows everything underneath it.
pub async fn products_in_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Product>>, AppError> {
    let categories = state.catalog.list_categories().await?;
    if !categories.iter().any(|c| c.id == id) {
        return Err(AppError::NotFound(format!("category {} not found", id)));
    }

    let mut ids: Vec<i64> = vec![id];
    ids.extend(
        categories
            .iter()
            .filter(|c| c.parent_id == Some(id))
            .map(|c| c.id),
    );

    let products = state.catalog.list_products_in_categories(&ids).await?;
    Ok(Json(products))
}
