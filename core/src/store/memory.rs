// core/src/store/memory.rs

//! In-process store for development and tests.
//!
//! A transaction holds an exclusive lock on the whole state for its lifetime
//! and works on a staged copy; commit swaps the copy in. Transactions are
//! therefore fully serialized, which is stronger than the read-committed plus
//! row-locking behavior the Postgres backend provides.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{Order, OrderStatus, Product, ProductImage};
use crate::repository::{
  OrderRepository, ProductFilter, ProductImageRepository, ProductPage, ProductRepository, RepositoryProvider,
  TransactionalStore,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
  // Insertion order; listings walk these backwards for newest-first.
  products: Vec<Product>,
  images: Vec<ProductImage>,
  orders: Vec<Order>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl TransactionalStore for MemoryStore {
  async fn begin(&self) -> StorefrontResult<Box<dyn RepositoryProvider>> {
    let committed = Arc::clone(&self.state).lock_owned().await;
    let staged = committed.clone();
    Ok(Box::new(MemoryScope { committed, staged }))
  }
}

struct MemoryScope {
  committed: OwnedMutexGuard<MemoryState>,
  staged: MemoryState,
}

impl MemoryScope {
  fn with_images(&self, mut product: Product) -> Product {
    product.images = self
      .staged
      .images
      .iter()
      .filter(|image| image.product_id == product.id)
      .cloned()
      .collect();
    product
  }

  fn find_product(&self, id: Uuid) -> Option<Product> {
    let product = self.staged.products.iter().find(|p| p.id == id)?.clone();
    Some(self.with_images(product))
  }
}

#[async_trait]
impl RepositoryProvider for MemoryScope {
  fn products(&mut self) -> &mut dyn ProductRepository {
    self
  }

  fn orders(&mut self) -> &mut dyn OrderRepository {
    self
  }

  fn images(&mut self) -> &mut dyn ProductImageRepository {
    self
  }

  async fn commit(self: Box<Self>) -> StorefrontResult<()> {
    let MemoryScope { mut committed, staged } = *self;
    *committed = staged;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StorefrontResult<()> {
    debug!("Discarding staged in-memory changes.");
    Ok(())
  }
}

#[async_trait]
impl ProductRepository for MemoryScope {
  async fn create(&mut self, product: &Product) -> StorefrontResult<()> {
    if self.staged.products.iter().any(|p| p.id == product.id) {
      return Err(anyhow!("duplicate product id {}", product.id).into());
    }
    let mut row = product.clone();
    row.images.clear();
    self.staged.products.push(row);
    Ok(())
  }

  async fn update(&mut self, product: &Product) -> StorefrontResult<()> {
    let row = self
      .staged
      .products
      .iter_mut()
      .find(|p| p.id == product.id)
      .ok_or_else(|| StorefrontError::product_not_found(product.id))?;
    let created_at = row.created_at;
    *row = Product {
      images: Vec::new(),
      created_at,
      ..product.clone()
    };
    Ok(())
  }

  async fn delete(&mut self, id: Uuid) -> StorefrontResult<()> {
    let before = self.staged.products.len();
    self.staged.products.retain(|p| p.id != id);
    if self.staged.products.len() == before {
      return Err(StorefrontError::product_not_found(id));
    }
    self.staged.images.retain(|image| image.product_id != id);
    Ok(())
  }

  async fn get_by_id(&mut self, id: Uuid) -> StorefrontResult<Option<Product>> {
    Ok(self.find_product(id))
  }

  async fn lock_by_id(&mut self, id: Uuid) -> StorefrontResult<Option<Product>> {
    // The scope already holds the store exclusively.
    Ok(self.find_product(id))
  }

  async fn list(&mut self, filter: &ProductFilter) -> StorefrontResult<ProductPage> {
    let needle = filter.search.to_lowercase();
    let matching: Vec<&Product> = self
      .staged
      .products
      .iter()
      .rev()
      .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
      .collect();

    let total = matching.len() as i64;
    let offset = usize::try_from(filter.offset.max(0)).unwrap_or(usize::MAX);
    let limit = if filter.limit > 0 {
      usize::try_from(filter.limit).unwrap_or(usize::MAX)
    } else {
      usize::MAX
    };

    let products = matching
      .into_iter()
      .skip(offset)
      .take(limit)
      .cloned()
      .map(|p| self.with_images(p))
      .collect();

    Ok(ProductPage { products, total })
  }
}

#[async_trait]
impl OrderRepository for MemoryScope {
  async fn create(&mut self, order: &Order) -> StorefrontResult<()> {
    if self.staged.orders.iter().any(|o| o.id == order.id) {
      return Err(anyhow!("duplicate order id {}", order.id).into());
    }
    self.staged.orders.push(order.clone());
    Ok(())
  }

  async fn list_by_user(&mut self, user_id: Uuid) -> StorefrontResult<Vec<Order>> {
    Ok(
      self
        .staged
        .orders
        .iter()
        .rev()
        .filter(|o| o.user_id == user_id)
        .cloned()
        .collect(),
    )
  }

  async fn has_pending_orders_for_product(&mut self, product_id: Uuid) -> StorefrontResult<bool> {
    Ok(
      self
        .staged
        .orders
        .iter()
        .any(|o| o.status == OrderStatus::Pending && o.references_product(product_id)),
    )
  }
}

#[async_trait]
impl ProductImageRepository for MemoryScope {
  async fn add_many(&mut self, images: &[ProductImage]) -> StorefrontResult<()> {
    for image in images {
      if !self.staged.products.iter().any(|p| p.id == image.product_id) {
        return Err(StorefrontError::product_not_found(image.product_id));
      }
    }
    self.staged.images.extend_from_slice(images);
    Ok(())
  }

  async fn list_by_product(&mut self, product_id: Uuid) -> StorefrontResult<Vec<ProductImage>> {
    Ok(
      self
        .staged
        .images
        .iter()
        .filter(|image| image.product_id == product_id)
        .cloned()
        .collect(),
    )
  }

  async fn count_by_product(&mut self, product_id: Uuid) -> StorefrontResult<i64> {
    let count = self.staged.images.iter().filter(|image| image.product_id == product_id).count();
    Ok(count as i64)
  }
}
