use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::product::{Category, Product, ProductVariant, VariantSize};
use crate::repository::CatalogRepository;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// In-memory catalog used by tests and local development seeds.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<BTreeMap<i64, Product>>,
    variants: RwLock<BTreeMap<i64, ProductVariant>>,
    sizes: RwLock<BTreeMap<i64, VariantSize>>,
    categories: RwLock<BTreeMap<i64, Category>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_product(&self, product: Product) {
        self.products.write().unwrap().insert(product.id, product);
    }

    pub fn insert_variant(&self, variant: ProductVariant) {
        self.variants.write().unwrap().insert(variant.id, variant);
    }

    pub fn insert_size(&self, size: VariantSize) {
        self.sizes.write().unwrap().insert(size.id, size);
    }

    pub fn insert_category(&self, category: Category) {
        self.categories.write().unwrap().insert(category.id, category);
    }

    pub fn remove_product(&self, id: i64) {
        self.products.write().unwrap().remove(&id);
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, BoxError> {
        Ok(self.products.read().unwrap().get(&id).cloned())
    }

    async fn get_variant(&self, id: i64) -> Result<Option<ProductVariant>, BoxError> {
        Ok(self.variants.read().unwrap().get(&id).cloned())
    }

    async fn get_size(&self, id: i64) -> Result<Option<VariantSize>, BoxError> {
        Ok(self.sizes.read().unwrap().get(&id).cloned())
    }

    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<Product>, BoxError> {
        Ok(self
            .products
            .read()
            .unwrap()
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BoxError> {
        Ok(self.categories.read().unwrap().values().cloned().collect())
    }

    async fn list_products_in_categories(&self, category_ids: &[i64]) -> Result<Vec<Product>, BoxError> {
        Ok(self
            .products
            .read()
            .unwrap()
            .values()
            .filter(|p| p.category_id.map(|c| category_ids.contains(&c)).unwrap_or(false))
            .cloned()
            .collect())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, BoxError> {
        let needle = query.to_lowercase();
        Ok(self
            .products
            .read()
            .unwrap()
            .values()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}
