// core/src/services/order_service.rs

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{StorefrontError, StorefrontResult};
use crate::models::{Order, OrderItem, OrderStatus};
use crate::repository::UnitOfWork;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceOrderInput {
  #[serde(default)]
  pub description: String,
  pub items: Vec<OrderLineInput>,
}

#[derive(Debug, Clone)]
pub struct OrderService {
  uow: UnitOfWork,
}

impl OrderService {
  pub fn new(uow: UnitOfWork) -> Self {
    Self { uow }
  }

  /// Turns a cart into a persisted `pending` order.
  ///
  /// Every line is checked against the stock read inside the transaction and
  /// decremented there before the next line is looked at, so a product listed
  /// twice is checked against what the first line left behind. The first
  /// failing line aborts the whole transaction: no stock moves and no order
  /// row is written.
  #[instrument(
    name = "order_service::place_order",
    skip(self, input),
    fields(user_id = %user_id, line_count = input.items.len())
  )]
  pub async fn place_order(&self, user_id: Uuid, input: PlaceOrderInput) -> StorefrontResult<Order> {
    if input.items.is_empty() {
      warn!("Rejected order with no items.");
      return Err(StorefrontError::Validation("order must contain at least one item".to_string()));
    }

    let order_id = Uuid::new_v4();
    let description = input.description.trim().to_string();
    let lines = input.items;

    let placed = self
      .uow
      .execute(move |repos| {
        Box::pin(async move {
          let now = Utc::now();
          let mut total_cents: i64 = 0;
          let mut items = Vec::with_capacity(lines.len());

          for line in &lines {
            if line.quantity <= 0 {
              return Err(StorefrontError::Validation(format!(
                "quantity for product {} must be greater than zero",
                line.product_id
              )));
            }

            let mut product = repos
              .products()
              .lock_by_id(line.product_id)
              .await?
              .ok_or_else(|| StorefrontError::product_not_found(line.product_id))?;

            if product.stock < line.quantity {
              return Err(StorefrontError::InsufficientStock {
                product_id: product.id,
                product_name: product.name,
                available: product.stock,
                requested: line.quantity,
              });
            }

            product.stock -= line.quantity;
            product.updated_at = now;
            repos.products().update(&product).await?;

            total_cents = product
              .price_cents
              .checked_mul(i64::from(line.quantity))
              .and_then(|line_total| total_cents.checked_add(line_total))
              .ok_or_else(|| StorefrontError::Validation("order total exceeds the supported range".to_string()))?;

            items.push(OrderItem {
              id: Uuid::new_v4(),
              order_id,
              product_id: product.id,
              quantity: line.quantity,
              unit_price_cents: product.price_cents,
              created_at: now,
              updated_at: now,
            });
          }

          let order = Order {
            id: order_id,
            user_id,
            description,
            total_price_cents: total_cents,
            status: OrderStatus::Pending,
            items,
            created_at: now,
            updated_at: now,
          };
          repos.orders().create(&order).await?;
          Ok::<_, StorefrontError>(order)
        })
      })
      .await;

    match placed {
      Ok(order) => {
        info!(
          order_id = %order.id,
          total_price_cents = order.total_price_cents,
          "Order placed."
        );
        Ok(order)
      }
      Err(err) => {
        warn!(order_id = %order_id, error = %err, "Order placement aborted.");
        Err(err)
      }
    }
  }

  #[instrument(name = "order_service::list_orders_for_user", skip(self), fields(user_id = %user_id))]
  pub async fn list_orders_for_user(&self, user_id: Uuid) -> StorefrontResult<Vec<Order>> {
    self
      .uow
      .execute(move |repos| Box::pin(async move { repos.orders().list_by_user(user_id).await }))
      .await
  }
}
