// core/src/services/product_service.rs

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::cache::TtlCache;
use crate::error::{StorefrontError, StorefrontResult};
use crate::models::Product;
use crate::repository::{ProductFilter, ProductPage, UnitOfWork};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

const NAME_MIN_CHARS: usize = 3;
const NAME_MAX_CHARS: usize = 100;
const DESCRIPTION_MIN_CHARS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductInput {
  pub name: String,
  pub description: String,
  pub price_cents: i64,
  pub stock: i32,
  pub category: String,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductInput {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price_cents: Option<i64>,
  pub stock: Option<i32>,
  pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListProductsInput {
  pub search: String,
  pub page: i64,
  pub page_size: i64,
}

#[derive(Debug, Clone)]
pub struct ProductService {
  uow: UnitOfWork,
  listing_cache: Option<Arc<TtlCache<ProductPage>>>,
}

impl ProductService {
  pub fn new(uow: UnitOfWork, listing_cache: Option<Arc<TtlCache<ProductPage>>>) -> Self {
    Self { uow, listing_cache }
  }

  #[instrument(name = "product_service::create", skip(self, input), fields(owner_id = %owner_id))]
  pub async fn create(&self, owner_id: Uuid, input: CreateProductInput) -> StorefrontResult<Product> {
    validate_create_input(&input)?;

    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: input.name.trim().to_string(),
      description: input.description.trim().to_string(),
      price_cents: input.price_cents,
      stock: input.stock,
      category: input.category.trim().to_string(),
      owner_id,
      images: Vec::new(),
      created_at: now,
      updated_at: now,
    };

    let product = self
      .uow
      .execute(move |repos| {
        Box::pin(async move {
          repos.products().create(&product).await?;
          Ok::<_, StorefrontError>(product)
        })
      })
      .await?;

    info!(product_id = %product.id, "Product created.");
    Ok(product)
  }

  #[instrument(name = "product_service::update", skip(self, input), fields(product_id = %id))]
  pub async fn update(&self, id: Uuid, input: UpdateProductInput) -> StorefrontResult<Product> {
    let product = self
      .uow
      .execute(move |repos| {
        Box::pin(async move {
          let mut product = repos
            .products()
            .lock_by_id(id)
            .await?
            .ok_or_else(|| StorefrontError::product_not_found(id))?;

          apply_update(&mut product, input)?;
          product.updated_at = Utc::now();

          repos.products().update(&product).await?;
          Ok::<_, StorefrontError>(product)
        })
      })
      .await?;

    info!("Product updated.");
    Ok(product)
  }

  /// Deletes a product unless a pending order still references it.
  ///
  /// Existence check, pending-order check and the delete share one
  /// transaction, so the check always sees committed orders and never the
  /// listing cache.
  #[instrument(name = "product_service::delete", skip(self), fields(product_id = %id))]
  pub async fn delete(&self, id: Uuid) -> StorefrontResult<()> {
    let outcome = self
      .uow
      .execute(move |repos| {
        Box::pin(async move {
          if repos.products().lock_by_id(id).await?.is_none() {
            return Err(StorefrontError::product_not_found(id));
          }

          if repos.orders().has_pending_orders_for_product(id).await? {
            return Err(StorefrontError::ProductHasPendingOrders { product_id: id });
          }

          repos.products().delete(id).await
        })
      })
      .await;

    match &outcome {
      Ok(()) => info!("Product deleted."),
      Err(StorefrontError::ProductHasPendingOrders { .. }) => warn!("Refused to delete product with pending orders."),
      Err(err @ (StorefrontError::Database(_) | StorefrontError::Infrastructure { .. })) => {
        error!(error = %err, "Failed to delete product.");
      }
      Err(err) => warn!(error = %err, "Product deletion rejected."),
    }
    outcome
  }

  #[instrument(name = "product_service::get", skip(self), fields(product_id = %id))]
  pub async fn get(&self, id: Uuid) -> StorefrontResult<Product> {
    self
      .uow
      .execute(move |repos| Box::pin(async move { repos.products().get_by_id(id).await }))
      .await?
      .ok_or_else(|| StorefrontError::product_not_found(id))
  }

  /// Paginated, searchable listing served through the listing cache when one
  /// is configured.
  #[instrument(name = "product_service::list", skip(self, input), fields(search = %input.search, page = input.page))]
  pub async fn list(&self, input: ListProductsInput) -> StorefrontResult<ProductPage> {
    let page = if input.page <= 0 { 1 } else { input.page };
    let page_size = match input.page_size {
      size if size <= 0 => DEFAULT_PAGE_SIZE,
      size => size.min(MAX_PAGE_SIZE),
    };
    let search = input.search.trim().to_string();
    let cache_key = listing_cache_key(&search, page, page_size);

    if let Some(cache) = &self.listing_cache {
      if let Some(cached) = cache.get(&cache_key) {
        debug!(%cache_key, "Product listing served from cache.");
        return Ok(cached);
      }
    }

    let filter = ProductFilter {
      search,
      limit: page_size,
      offset: (page - 1).saturating_mul(page_size),
    };
    let listing = self
      .uow
      .execute(move |repos| Box::pin(async move { repos.products().list(&filter).await }))
      .await?;

    if let Some(cache) = &self.listing_cache {
      if !cache.set(cache_key.clone(), listing.clone()) {
        debug!(%cache_key, "Listing cache full; result not cached.");
      }
    }
    Ok(listing)
  }
}

fn listing_cache_key(search: &str, page: i64, page_size: i64) -> String {
  format!("products:list:{}:{}:{}", search.to_lowercase(), page, page_size)
}

fn validate_create_input(input: &CreateProductInput) -> StorefrontResult<()> {
  let name_chars = input.name.trim().chars().count();
  if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&name_chars) {
    return Err(StorefrontError::Validation(format!(
      "name must be between {} and {} characters",
      NAME_MIN_CHARS, NAME_MAX_CHARS
    )));
  }
  if input.description.trim().chars().count() < DESCRIPTION_MIN_CHARS {
    return Err(StorefrontError::Validation(format!(
      "description must be at least {} characters",
      DESCRIPTION_MIN_CHARS
    )));
  }
  if input.price_cents <= 0 {
    return Err(StorefrontError::Validation("price must be greater than zero".to_string()));
  }
  if input.stock < 0 {
    return Err(StorefrontError::Validation("stock must be non-negative".to_string()));
  }
  if input.category.trim().is_empty() {
    return Err(StorefrontError::Validation("category is required".to_string()));
  }
  Ok(())
}

fn apply_update(product: &mut Product, input: UpdateProductInput) -> StorefrontResult<()> {
  if let Some(name) = input.name {
    let name = name.trim();
    if name.is_empty() {
      return Err(StorefrontError::Validation("name cannot be empty".to_string()));
    }
    product.name = name.to_string();
  }
  if let Some(description) = input.description {
    let description = description.trim();
    if description.is_empty() {
      return Err(StorefrontError::Validation("description cannot be empty".to_string()));
    }
    product.description = description.to_string();
  }
  if let Some(price_cents) = input.price_cents {
    if price_cents <= 0 {
      return Err(StorefrontError::Validation("price must be greater than zero".to_string()));
    }
    product.price_cents = price_cents;
  }
  if let Some(stock) = input.stock {
    if stock < 0 {
      return Err(StorefrontError::Validation("stock must be non-negative".to_string()));
    }
    product.stock = stock;
  }
  if let Some(category) = input.category {
    let category = category.trim();
    if category.is_empty() {
      return Err(StorefrontError::Validation("category cannot be empty".to_string()));
    }
    product.category = category.to_string();
  }
  Ok(())
}
