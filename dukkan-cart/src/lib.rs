pub mod cart;
pub mod pricing;

pub use cart::Cart;
pub use pricing::{price_cart, DeliveryPolicy, LineItemSnapshot, PricedCart};
