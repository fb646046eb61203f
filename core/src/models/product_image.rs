// core/src/models/product_image.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
  pub id: Uuid,
  pub product_id: Uuid,
  pub url: String,
  pub created_at: DateTime<Utc>,
}
