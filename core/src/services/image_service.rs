// core/src/services/image_service.rs

//! Records product images. Uploading the bytes to object storage happens
//! upstream; this service only stores the resulting URLs.

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{StorefrontError, StorefrontResult};
use crate::models::ProductImage;
use crate::repository::UnitOfWork;

pub const MAX_IMAGES_PER_PRODUCT: i64 = 4;

#[derive(Debug, Clone)]
pub struct ImageService {
  uow: UnitOfWork,
}

impl ImageService {
  pub fn new(uow: UnitOfWork) -> Self {
    Self { uow }
  }

  #[instrument(name = "image_service::attach_images", skip(self, urls), fields(product_id = %product_id, url_count = urls.len()))]
  pub async fn attach_images(&self, product_id: Uuid, urls: Vec<String>) -> StorefrontResult<Vec<ProductImage>> {
    if urls.is_empty() {
      return Err(StorefrontError::Validation("no images provided".to_string()));
    }
    if urls.len() as i64 > MAX_IMAGES_PER_PRODUCT {
      return Err(StorefrontError::Validation(format!(
        "maximum {} images allowed per request",
        MAX_IMAGES_PER_PRODUCT
      )));
    }
    let urls: Vec<String> = urls.iter().map(|url| url.trim().to_string()).collect();
    if urls.iter().any(String::is_empty) {
      return Err(StorefrontError::Validation("image url cannot be empty".to_string()));
    }

    let images = self
      .uow
      .execute(move |repos| {
        Box::pin(async move {
          if repos.products().lock_by_id(product_id).await?.is_none() {
            return Err(StorefrontError::product_not_found(product_id));
          }

          let current = repos.images().count_by_product(product_id).await?;
          if current + urls.len() as i64 > MAX_IMAGES_PER_PRODUCT {
            return Err(StorefrontError::Validation(format!(
              "upload would exceed limit of {} images per product",
              MAX_IMAGES_PER_PRODUCT
            )));
          }

          let now = Utc::now();
          let images: Vec<ProductImage> = urls
            .into_iter()
            .map(|url| ProductImage {
              id: Uuid::new_v4(),
              product_id,
              url,
              created_at: now,
            })
            .collect();

          repos.images().add_many(&images).await?;
          Ok(images)
        })
      })
      .await?;

    info!(stored = images.len(), "Product images recorded.");
    Ok(images)
  }

  #[instrument(name = "image_service::list_images", skip(self), fields(product_id = %product_id))]
  pub async fn list_images(&self, product_id: Uuid) -> StorefrontResult<Vec<ProductImage>> {
    self
      .uow
      .execute(move |repos| {
        Box::pin(async move {
          if repos.products().get_by_id(product_id).await?.is_none() {
            return Err(StorefrontError::product_not_found(product_id));
          }
          repos.images().list_by_product(product_id).await
        })
      })
      .await
  }
}
