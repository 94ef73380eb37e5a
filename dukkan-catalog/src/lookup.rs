use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::line_item::LineItemKey;
use crate::product::variant_display_name;
use crate::repository::CatalogRepository;

/// A line-item key resolved against the catalog: what to show on the line
/// and what one unit costs right now.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedLine {
    pub name: String,
    pub unit_price: Decimal,
    pub product_id: i64,
}

/// Resolve a line-item key to a priced line.
///
/// Returns `None` when any referenced entity is missing or inconsistent
/// (product deleted after it was added to a cart, size detached from its
/// variant). Callers skip such lines rather than failing the whole cart.
pub async fn resolve_line(
    catalog: &dyn CatalogRepository,
    key: &LineItemKey,
) -> Result<Option<ResolvedLine>, Box<dyn std::error::Error + Send + Sync>> {
    match key {
        LineItemKey::Simple(product_id) => {
            let Some(product) = catalog.get_product(*product_id).await? else {
                return Ok(None);
            };
            Ok(Some(ResolvedLine {
                name: product.name.clone(),
                unit_price: product.price,
                product_id: product.id,
            }))
        }
        LineItemKey::Variant { variant_id, size_id } => {
            let Some(variant) = catalog.get_variant(*variant_id).await? else {
                return Ok(None);
            };
            let Some(size) = catalog.get_size(*size_id).await? else {
                return Ok(None);
            };
            if size.variant_id != variant.id {
                return Ok(None);
            }
            let Some(product) = catalog.get_product(variant.product_id).await? else {
                return Ok(None);
            };
            Ok(Some(ResolvedLine {
                name: variant_display_name(&product, &variant, &size),
                unit_price: variant.price,
                product_id: product.id,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalog;
    use crate::product::{Product, ProductVariant, VariantSize};

    fn sample_catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new();
        catalog.insert_product(Product {
            id: 1,
            name: "Desk Lamp".to_string(),
            description: "Warm white".to_string(),
            price: Decimal::new(300, 2),
            category_id: None,
            image_url: None,
            brand: None,
        });
        catalog.insert_product(Product {
            id: 2,
            name: "Runner Pro".to_string(),
            description: String::new(),
            price: Decimal::ZERO,
            category_id: None,
            image_url: None,
            brand: None,
        });
        catalog.insert_variant(ProductVariant {
            id: 4,
            product_id: 2,
            color_name: "Royal Blue".to_string(),
            color_hex: "#0000FF".to_string(),
            price: Decimal::new(1250, 2),
            image_url: None,
        });
        catalog.insert_size(VariantSize {
            id: 7,
            variant_id: 4,
            size: "42".to_string(),
            stock: 3,
        });
        catalog
    }

    #[tokio::test]
    async fn test_resolves_simple_product() {
        let catalog = sample_catalog();
        let line = resolve_line(&catalog, &LineItemKey::Simple(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(line.name, "Desk Lamp");
        assert_eq!(line.unit_price, Decimal::new(300, 2));
        assert_eq!(line.product_id, 1);
    }

    #[tokio::test]
    async fn test_resolves_variant_with_size() {
        let catalog = sample_catalog();
        let key = LineItemKey::Variant {
            variant_id: 4,
            size_id: 7,
        };
        let line = resolve_line(&catalog, &key).await.unwrap().unwrap();
        assert_eq!(line.name, "Runner Pro - Royal Blue (Size 42)");
        assert_eq!(line.unit_price, Decimal::new(1250, 2));
        assert_eq!(line.product_id, 2);
    }

    #[tokio::test]
    async fn test_missing_product_skips_line() {
        let catalog = sample_catalog();
        let line = resolve_line(&catalog, &LineItemKey::Simple(99)).await.unwrap();
        assert!(line.is_none());
    }

    #[tokio::test]
    async fn test_size_from_other_variant_skips_line() {
        let catalog = sample_catalog();
        catalog.insert_variant(ProductVariant {
            id: 5,
            product_id: 2,
            color_name: "Black".to_string(),
            color_hex: "#000000".to_string(),
            price: Decimal::new(1300, 2),
            image_url: None,
        });
        // Size 7 belongs to variant 4, not 5.
        let key = LineItemKey::Variant {
            variant_id: 5,
            size_id: 7,
        };
        assert!(resolve_line(&catalog, &key).await.unwrap().is_none());
    }
}
