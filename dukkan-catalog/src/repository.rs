use async_trait::async_trait;

use crate::product::{Category, Product, ProductVariant, VariantSize};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Read access to the product catalog.
///
/// Lookups return `Ok(None)` for missing rows; callers decide whether a
/// missing row is an error (product detail pages) or a line to skip
/// (cart pricing).
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, BoxError>;

    async fn get_variant(&self, id: i64) -> Result<Option<ProductVariant>, BoxError>;

    async fn get_size(&self, id: i64) -> Result<Option<VariantSize>, BoxError>;

    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<Product>, BoxError>;

    async fn list_categories(&self) -> Result<Vec<Category>, BoxError>;

    /// Products belonging to any of the given categories.
    async fn list_products_in_categories(&self, category_ids: &[i64]) -> Result<Vec<Product>, BoxError>;

    /// Case-insensitive name/description search.
    async fn search_products(&self, query: &str) -> Result<Vec<Product>, BoxError>;
}
