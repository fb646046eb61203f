// core/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

use super::OrderItem;

/// Matches the `order_status_enum` Postgres type.
///
/// Orders are created `Pending` and nothing in this crate moves them on;
/// the other states exist so stored data written by other tooling decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, SqlxType)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Completed,
  Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub description: String,
  /// Sum of `unit_price_cents * quantity` over `items`.
  pub total_price_cents: i64,
  pub status: OrderStatus,
  #[sqlx(skip)]
  pub items: Vec<OrderItem>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  pub fn references_product(&self, product_id: Uuid) -> bool {
    self.items.iter().any(|item| item.product_id == product_id)
  }
}
