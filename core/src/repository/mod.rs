// core/src/repository/mod.rs

//! Repository contracts. Every repository handed out by this crate is bound to
//! one transaction scope; see [`unit_of_work`].

pub mod unit_of_work;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::StorefrontResult;
use crate::models::{Order, Product, ProductImage};

pub use unit_of_work::{RepositoryProvider, TransactionalStore, UnitOfWork};

/// Search and paging window for product listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
  /// Case-insensitive substring of the product name. Empty matches everything.
  pub search: String,
  pub limit: i64,
  pub offset: i64,
}

/// One page of a product listing plus the number of products matching the
/// filter across all pages.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPage {
  pub products: Vec<Product>,
  pub total: i64,
}

#[async_trait]
pub trait ProductRepository: Send {
  async fn create(&mut self, product: &Product) -> StorefrontResult<()>;

  /// Overwrites the stored row. Fails with `NotFound` if no row has `product.id`.
  async fn update(&mut self, product: &Product) -> StorefrontResult<()>;

  /// Fails with `NotFound` if no row was removed.
  async fn delete(&mut self, id: Uuid) -> StorefrontResult<()>;

  async fn get_by_id(&mut self, id: Uuid) -> StorefrontResult<Option<Product>>;

  /// Like [`get_by_id`](Self::get_by_id), but also takes a write lock on the
  /// row for the rest of the transaction so no concurrent transaction can
  /// observe or change its stock until this one finishes.
  async fn lock_by_id(&mut self, id: Uuid) -> StorefrontResult<Option<Product>>;

  /// Newest first.
  async fn list(&mut self, filter: &ProductFilter) -> StorefrontResult<ProductPage>;
}

#[async_trait]
pub trait OrderRepository: Send {
  /// Persists the order together with all of its items.
  async fn create(&mut self, order: &Order) -> StorefrontResult<()>;

  /// Newest first, items included.
  async fn list_by_user(&mut self, user_id: Uuid) -> StorefrontResult<Vec<Order>>;

  /// True when at least one `pending` order has an item for `product_id`.
  async fn has_pending_orders_for_product(&mut self, product_id: Uuid) -> StorefrontResult<bool>;
}

#[async_trait]
pub trait ProductImageRepository: Send {
  async fn add_many(&mut self, images: &[ProductImage]) -> StorefrontResult<()>;

  /// Oldest first.
  async fn list_by_product(&mut self, product_id: Uuid) -> StorefrontResult<Vec<ProductImage>>;

  async fn count_by_product(&mut self, product_id: Uuid) -> StorefrontResult<i64>;
}
