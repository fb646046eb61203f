// core/src/store/postgres.rs

//! Postgres backend built on `sqlx`.
//!
//! Each scope is one `sqlx::Transaction`. Stock reads on the placement path go
//! through [`ProductRepository::lock_by_id`], which issues `SELECT ... FOR
//! UPDATE`; concurrent placements for the same product therefore queue on the
//! row lock instead of both seeing the pre-decrement stock.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{Order, OrderItem, OrderStatus, Product, ProductImage};
use crate::repository::{
  OrderRepository, ProductFilter, ProductImageRepository, ProductPage, ProductRepository, RepositoryProvider,
  TransactionalStore,
};

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, stock, category, owner_id, created_at, updated_at";
const ORDER_COLUMNS: &str = "id, user_id, description, total_price_cents, status, created_at, updated_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents, created_at, updated_at";
const IMAGE_COLUMNS: &str = "id, product_id, url, created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn from_pool(pool: PgPool) -> Self {
    Self { pool }
  }

  #[instrument(name = "pg_store::connect", skip(database_url))]
  pub async fn connect(database_url: &str, max_connections: u32) -> StorefrontResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    info!("Connected to Postgres.");
    Ok(Self { pool })
  }

  /// Applies the migrations embedded from `core/migrations`.
  #[instrument(name = "pg_store::migrate", skip(self))]
  pub async fn migrate(&self) -> StorefrontResult<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }

  pub fn pool(&self) -> &PgPool {
    &self.pool
  }
}

#[async_trait]
impl TransactionalStore for PgStore {
  async fn begin(&self) -> StorefrontResult<Box<dyn RepositoryProvider>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgScope { tx }))
  }
}

struct PgScope {
  tx: Transaction<'static, Postgres>,
}

/// Escapes `LIKE` metacharacters so user search text matches literally.
fn like_pattern(search: &str) -> String {
  let mut escaped = String::with_capacity(search.len() + 2);
  escaped.push('%');
  for ch in search.to_lowercase().chars() {
    if matches!(ch, '\\' | '%' | '_') {
      escaped.push('\\');
    }
    escaped.push(ch);
  }
  escaped.push('%');
  escaped
}

impl PgScope {
  async fn images_for(&mut self, product_ids: &[Uuid]) -> StorefrontResult<HashMap<Uuid, Vec<ProductImage>>> {
    if product_ids.is_empty() {
      return Ok(HashMap::new());
    }
    let images: Vec<ProductImage> = sqlx::query_as(&format!(
      "SELECT {IMAGE_COLUMNS} FROM product_images WHERE product_id = ANY($1) ORDER BY created_at ASC, id ASC"
    ))
    .bind(product_ids)
    .fetch_all(&mut *self.tx)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    for image in images {
      grouped.entry(image.product_id).or_default().push(image);
    }
    Ok(grouped)
  }

  async fn fetch_product(&mut self, id: Uuid, for_update: bool) -> StorefrontResult<Option<Product>> {
    let lock_clause = if for_update { " FOR UPDATE" } else { "" };
    let product: Option<Product> =
      sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1{lock_clause}"))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

    match product {
      Some(mut product) => {
        product.images = self.images_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(product))
      }
      None => Ok(None),
    }
  }
}

#[async_trait]
impl RepositoryProvider for PgScope {
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
    self.tx.commit().await?;
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StorefrontResult<()> {
    self.tx.rollback().await?;
    Ok(())
  }
}

#[async_trait]
impl ProductRepository for PgScope {
  async fn create(&mut self, product: &Product) -> StorefrontResult<()> {
    sqlx::query(
      "INSERT INTO products (id, name, description, price_cents, stock, category, owner_id, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(&product.category)
    .bind(product.owner_id)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *self.tx)
    .await?;
    Ok(())
  }

  async fn update(&mut self, product: &Product) -> StorefrontResult<()> {
    let result = sqlx::query(
      "UPDATE products
       SET name = $2, description = $3, price_cents = $4, stock = $5, category = $6, owner_id = $7, updated_at = $8
       WHERE id = $1",
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price_cents)
    .bind(product.stock)
    .bind(&product.category)
    .bind(product.owner_id)
    .bind(product.updated_at)
    .execute(&mut *self.tx)
    .await?;

    if result.rows_affected() == 0 {
      return Err(StorefrontError::product_not_found(product.id));
    }
    Ok(())
  }

  async fn delete(&mut self, id: Uuid) -> StorefrontResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
      .bind(id)
      .execute(&mut *self.tx)
      .await?;

    if result.rows_affected() == 0 {
      return Err(StorefrontError::product_not_found(id));
    }
    Ok(())
  }

  async fn get_by_id(&mut self, id: Uuid) -> StorefrontResult<Option<Product>> {
    self.fetch_product(id, false).await
  }

  async fn lock_by_id(&mut self, id: Uuid) -> StorefrontResult<Option<Product>> {
    self.fetch_product(id, true).await
  }

  async fn list(&mut self, filter: &ProductFilter) -> StorefrontResult<ProductPage> {
    let pattern = like_pattern(&filter.search);
    let match_all = filter.search.is_empty();

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE $1 OR LOWER(name) LIKE $2")
      .bind(match_all)
      .bind(&pattern)
      .fetch_one(&mut *self.tx)
      .await?;

    let limit = if filter.limit > 0 { Some(filter.limit) } else { None };
    let mut products: Vec<Product> = sqlx::query_as(&format!(
      "SELECT {PRODUCT_COLUMNS} FROM products
       WHERE $1 OR LOWER(name) LIKE $2
       ORDER BY created_at DESC, id ASC
       LIMIT $3 OFFSET $4"
    ))
    .bind(match_all)
    .bind(&pattern)
    .bind(limit)
    .bind(filter.offset.max(0))
    .fetch_all(&mut *self.tx)
    .await?;

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut images = self.images_for(&ids).await?;
    for product in &mut products {
      product.images = images.remove(&product.id).unwrap_or_default();
    }

    Ok(ProductPage { products, total })
  }
}

#[async_trait]
impl OrderRepository for PgScope {
  async fn create(&mut self, order: &Order) -> StorefrontResult<()> {
    sqlx::query(
      "INSERT INTO orders (id, user_id, description, total_price_cents, status, created_at, updated_at)
       VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(&order.description)
    .bind(order.total_price_cents)
    .bind(order.status)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *self.tx)
    .await?;

    for item in &order.items {
      sqlx::query(
        "INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
      )
      .bind(item.id)
      .bind(order.id)
      .bind(item.product_id)
      .bind(item.quantity)
      .bind(item.unit_price_cents)
      .bind(item.created_at)
      .bind(item.updated_at)
      .execute(&mut *self.tx)
      .await?;
    }
    Ok(())
  }

  async fn list_by_user(&mut self, user_id: Uuid) -> StorefrontResult<Vec<Order>> {
    let mut orders: Vec<Order> = sqlx::query_as(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id ASC"
    ))
    .bind(user_id)
    .fetch_all(&mut *self.tx)
    .await?;

    if orders.is_empty() {
      return Ok(orders);
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let items: Vec<OrderItem> = sqlx::query_as(&format!(
      "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY created_at ASC, id ASC"
    ))
    .bind(&order_ids)
    .fetch_all(&mut *self.tx)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in items {
      grouped.entry(item.order_id).or_default().push(item);
    }
    for order in &mut orders {
      order.items = grouped.remove(&order.id).unwrap_or_default();
    }
    Ok(orders)
  }

  async fn has_pending_orders_for_product(&mut self, product_id: Uuid) -> StorefrontResult<bool> {
    let exists: bool = sqlx::query_scalar(
      "SELECT EXISTS (
         SELECT 1 FROM order_items oi
         INNER JOIN orders o ON oi.order_id = o.id
         WHERE oi.product_id = $1 AND o.status = $2
       )",
    )
    .bind(product_id)
    .bind(OrderStatus::Pending)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(exists)
  }
}

#[async_trait]
impl ProductImageRepository for PgScope {
  async fn add_many(&mut self, images: &[ProductImage]) -> StorefrontResult<()> {
    for image in images {
      sqlx::query("INSERT INTO product_images (id, product_id, url, created_at) VALUES ($1, $2, $3, $4)")
        .bind(image.id)
        .bind(image.product_id)
        .bind(&image.url)
        .bind(image.created_at)
        .execute(&mut *self.tx)
        .await?;
    }
    Ok(())
  }

  async fn list_by_product(&mut self, product_id: Uuid) -> StorefrontResult<Vec<ProductImage>> {
    Ok(self.images_for(&[product_id]).await?.remove(&product_id).unwrap_or_default())
  }

  async fn count_by_product(&mut self, product_id: Uuid) -> StorefrontResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_images WHERE product_id = $1")
      .bind(product_id)
      .fetch_one(&mut *self.tx)
      .await?;
    Ok(count)
  }
}
