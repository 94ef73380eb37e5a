use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog category. Categories form a two-level tree: top-level categories
/// have no parent, subcategories point at one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub emoji: Option<String>,
}

impl Category {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A catalog product. Simple products are priced directly; products sold in
/// color/size combinations carry their price on the variant instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: Option<i64>,
    pub image_url: Option<String>,
    pub brand: Option<String>,
}

/// A color variant of a product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub color_name: String,
    pub color_hex: String,
    pub price: Decimal,
    pub image_url: Option<String>,
}

/// A size of a variant, with its own stock level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariantSize {
    pub id: i64,
    pub variant_id: i64,
    pub size: String,
    pub stock: i32,
}

/// Display name used on order lines for a variant purchase,
/// e.g. `Runner Pro - Royal Blue (Size 42)`.
pub fn variant_display_name(product: &Product, variant: &ProductVariant, size: &VariantSize) -> String {
    format!("{} - {} (Size {})", product.name, variant.color_name, size.size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_display_name() {
        let product = Product {
            id: 1,
            name: "Runner Pro".to_string(),
            description: String::new(),
            price: Decimal::ZERO,
            category_id: None,
            image_url: None,
            brand: None,
        };
        let variant = ProductVariant {
            id: 4,
            product_id: 1,
            color_name: "Royal Blue".to_string(),
            color_hex: "#0000FF".to_string(),
            price: Decimal::new(1250, 2),
            image_url: None,
        };
        let size = VariantSize {
            id: 7,
            variant_id: 4,
            size: "42".to_string(),
            stock: 3,
        };
        assert_eq!(
            variant_display_name(&product, &variant, &size),
            "Runner Pro - Royal Blue (Size 42)"
        );
    }
}
