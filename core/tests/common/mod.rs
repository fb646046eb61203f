// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset of these helpers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use storefront::{
  CreateProductInput, ImageService, MemoryStore, Order, OrderRepository, OrderService, Product, ProductImageRepository,
  ProductPage, ProductRepository, ProductService, RepositoryProvider, StorefrontResult, TransactionalStore, TtlCache,
  UnitOfWork,
};
use tracing::Level;
use uuid::Uuid;

// --- Tracing Setup (once per test binary) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Service Harness ---
pub struct Harness {
  pub uow: UnitOfWork,
  pub products: ProductService,
  pub orders: OrderService,
  pub images: ImageService,
  pub cache: Option<Arc<TtlCache<ProductPage>>>,
}

pub fn harness() -> Harness {
  harness_over(Arc::new(MemoryStore::new()), None)
}

pub fn harness_with_cache(ttl: Duration, capacity: usize) -> Harness {
  harness_over(Arc::new(MemoryStore::new()), Some(Arc::new(TtlCache::new(ttl, capacity))))
}

pub fn harness_over(store: Arc<dyn TransactionalStore>, cache: Option<Arc<TtlCache<ProductPage>>>) -> Harness {
  let uow = UnitOfWork::new(store);
  Harness {
    products: ProductService::new(uow.clone(), cache.clone()),
    orders: OrderService::new(uow.clone()),
    images: ImageService::new(uow.clone()),
    uow,
    cache,
  }
}

pub fn product_input(name: &str, price_cents: i64, stock: i32) -> CreateProductInput {
  CreateProductInput {
    name: name.to_string(),
    description: format!("{} for the integration tests", name),
    price_cents,
    stock,
    category: "testing".to_string(),
  }
}

pub async fn seed_product(h: &Harness, name: &str, price_cents: i64, stock: i32) -> Product {
  h.products
    .create(Uuid::new_v4(), product_input(name, price_cents, stock))
    .await
    .expect("seeding a product should succeed")
}

/// Reads stock straight from the store, bypassing any cache.
pub async fn stock_of(h: &Harness, product_id: Uuid) -> i32 {
  h.products.get(product_id).await.expect("product should exist").stock
}

pub async fn orders_of(h: &Harness, user_id: Uuid) -> Vec<Order> {
  h.orders
    .list_orders_for_user(user_id)
    .await
    .expect("listing orders should succeed")
}

// --- Store whose order writes always fail ---
//
// Product and image access goes to a real in-memory scope, so everything the
// placement algorithm does up to persisting the order really happens inside
// the transaction before the failure.

#[derive(Debug, Default, Clone)]
pub struct FailingOrderWritesStore {
  inner: MemoryStore,
}

#[async_trait]
impl TransactionalStore for FailingOrderWritesStore {
  async fn begin(&self) -> StorefrontResult<Box<dyn RepositoryProvider>> {
    let inner = self.inner.begin().await?;
    Ok(Box::new(FailingOrderWritesScope {
      inner,
      orders: RejectingOrders,
    }))
  }
}

struct FailingOrderWritesScope {
  inner: Box<dyn RepositoryProvider>,
  orders: RejectingOrders,
}

struct RejectingOrders;

#[async_trait]
impl OrderRepository for RejectingOrders {
  async fn create(&mut self, _order: &Order) -> StorefrontResult<()> {
    Err(anyhow!("simulated connection reset while writing order").into())
  }

  async fn list_by_user(&mut self, _user_id: Uuid) -> StorefrontResult<Vec<Order>> {
    Ok(Vec::new())
  }

  async fn has_pending_orders_for_product(&mut self, _product_id: Uuid) -> StorefrontResult<bool> {
    Ok(false)
  }
}

#[async_trait]
impl RepositoryProvider for FailingOrderWritesScope {
  fn products(&mut self) -> &mut dyn ProductRepository {
    self.inner.products()
  }

  fn orders(&mut self) -> &mut dyn OrderRepository {
    &mut self.orders
  }

  fn images(&mut self) -> &mut dyn ProductImageRepository {
    self.inner.images()
  }

  async fn commit(self: Box<Self>) -> StorefrontResult<()> {
    self.inner.commit().await
  }

  async fn rollback(self: Box<Self>) -> StorefrontResult<()> {
    self.inner.rollback().await
  }
}
