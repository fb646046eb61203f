// core/src/models/order_item.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One line of an order. `unit_price_cents` is the price the product had when
/// the order was placed and is never rewritten afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  pub unit_price_cents: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl OrderItem {
  pub fn line_total_cents(&self) -> Option<i64> {
    self.unit_price_cents.checked_mul(i64::from(self.quantity))
  }
}
