// core/src/services/mod.rs

//! Use-case services. Each public operation runs in its own unit of work.

pub mod image_service;
pub mod order_service;
pub mod product_service;

pub use image_service::{ImageService, MAX_IMAGES_PER_PRODUCT};
pub use order_service::{OrderLineInput, OrderService, PlaceOrderInput};
pub use product_service::{
  CreateProductInput, ListProductsInput, ProductService, UpdateProductInput, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
