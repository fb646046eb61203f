// core/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::ProductImage;

/// A catalog entry.
///
/// `stock` never goes negative and `price_cents` is strictly positive once the
/// product exists; the Postgres schema enforces both with `CHECK` constraints
/// and the services validate before writing.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub price_cents: i64,
  pub stock: i32,
  pub category: String,
  /// The administrator that created the product.
  pub owner_id: Uuid,
  #[sqlx(skip)]
  pub images: Vec<ProductImage>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
