pub mod line_item;
pub mod lookup;
pub mod memory;
pub mod product;
pub mod repository;

pub use line_item::LineItemKey;
pub use lookup::{resolve_line, ResolvedLine};
pub use memory::InMemoryCatalog;
pub use product::{Category, Product, ProductVariant, VariantSize};
pub use repository::CatalogRepository;
