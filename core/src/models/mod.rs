// core/src/models/mod.rs

//! Entities owned by the order-processing core.

pub mod order;
pub mod order_item;
pub mod product;
pub mod product_image;

pub use order::{Order, OrderStatus};
pub use order_item::OrderItem;
pub use product::Product;
pub use product_image::ProductImage;
