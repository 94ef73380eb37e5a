use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use dukkan_catalog::{Category, CatalogRepository, Product, ProductVariant, VariantSize};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: Decimal,
    category_id: Option<i64>,
    image_url: Option<String>,
    brand: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            category_id: row.category_id,
            image_url: row.image_url,
            brand: row.brand,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VariantRow {
    id: i64,
    product_id: i64,
    color_name: String,
    color_hex: String,
    price: Decimal,
    image_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct SizeRow {
    id: i64,
    variant_id: i64,
    size: String,
    stock: i32,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    parent_id: Option<i64>,
    emoji: Option<String>,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, category_id, image_url, brand";

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, BoxError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = $1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn get_variant(&self, id: i64) -> Result<Option<ProductVariant>, BoxError> {
        let row = sqlx::query_as::<_, VariantRow>(
            "SELECT id, product_id, color_name, color_hex, price, image_url \
             FROM product_variants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| ProductVariant {
            id: r.id,
            product_id: r.product_id,
            color_name: r.color_name,
            color_hex: r.color_hex,
            price: r.price,
            image_url: r.image_url,
        }))
    }

    async fn get_size(&self, id: i64) -> Result<Option<VariantSize>, BoxError> {
        let row = sqlx::query_as::<_, SizeRow>(
            "SELECT id, variant_id, size, stock FROM variant_sizes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| VariantSize {
            id: r.id,
            variant_id: r.variant_id,
            size: r.size,
            stock: r.stock,
        }))
    }

    async fn list_products(&self, limit: i64, offset: i64) -> Result<Vec<Product>, BoxError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products ORDER BY id LIMIT $1 OFFSET $2",
            PRODUCT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, BoxError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, parent_id, emoji FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: r.id,
                name: r.name,
                parent_id: r.parent_id,
                emoji: r.emoji,
            })
            .collect())
    }

    async fn list_products_in_categories(&self, category_ids: &[i64]) -> Result<Vec<Product>, BoxError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE category_id = ANY($1) ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .bind(category_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, BoxError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products \
             WHERE name ILIKE '%' || $1 || '%' OR description ILIKE '%' || $1 || '%' \
             ORDER BY id",
            PRODUCT_COLUMNS
        ))
        .bind(query)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
