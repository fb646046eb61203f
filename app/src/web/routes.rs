// app/src/web/routes.rs

use actix_web::web;

use storefront::StorefrontError;

use crate::errors::AppError;
use crate::web::handlers::{order_handlers, product_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Malformed JSON bodies answer with the same 400 shape as any other
/// validation failure.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default()
    .error_handler(|err, _req| AppError::from(StorefrontError::Validation(err.to_string())).into())
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.app_data(json_config()).service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("", web::post().to(product_handlers::create_product_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
          .route("/{product_id}", web::put().to(product_handlers::update_product_handler))
          .route("/{product_id}", web::delete().to(product_handlers::delete_product_handler))
          .route("/{product_id}/images", web::get().to(product_handlers::list_images_handler))
          .route("/{product_id}/images", web::post().to(product_handlers::attach_images_handler)),
      )
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("", web::post().to(order_handlers::place_order_handler)),
      ),
  );
}
