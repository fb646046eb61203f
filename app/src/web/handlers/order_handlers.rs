// app/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use storefront::PlaceOrderInput;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(
    name = "handler::place_order",
    skip(app_state, payload, auth_user),
    fields(user_id = %auth_user.user_id, line_count = payload.items.len())
)]
pub async fn place_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<PlaceOrderInput>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .orders
    .place_order(auth_user.user_id, payload.into_inner())
    .await?;

  info!(order_id = %order.id, total_price_cents = order.total_price_cents, "Order placed via API.");
  Ok(HttpResponse::Created().json(json!({
      "message": "Order placed successfully.",
      "order": order
  })))
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list_orders_for_user(auth_user.user_id).await?;
  Ok(HttpResponse::Ok().json(json!({ "orders": orders })))
}
