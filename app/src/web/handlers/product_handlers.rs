// app/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront::{CreateProductInput, ListProductsInput, UpdateProductInput};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug, Default)]
pub struct ListProductsQuery {
  #[serde(default)]
  pub search: String,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct AttachImagesPayload {
  pub urls: Vec<String>,
}

#[instrument(name = "handler::list_products", skip(app_state, query))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let query = query.into_inner();
  let input = ListProductsInput {
    search: query.search,
    page: query.page.unwrap_or(0),
    page_size: query.limit.unwrap_or(0),
  };

  let listing = app_state.products.list(input).await?;

  Ok(HttpResponse::Ok().json(json!({
      "products": listing.products,
      "total": listing.total,
  })))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.products.get(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "product": product })))
}

#[instrument(name = "handler::create_product", skip(app_state, payload, admin), fields(admin_id = %admin.0.user_id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateProductInput>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product = app_state.products.create(admin.0.user_id, payload.into_inner()).await?;
  info!(product_id = %product.id, "Product created via API.");
  Ok(HttpResponse::Created().json(json!({
      "message": "Product created successfully.",
      "product": product
  })))
}

#[instrument(name = "handler::update_product", skip(app_state, path, payload, _admin), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateProductInput>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .products
    .update(path.into_inner(), payload.into_inner())
    .await?;
  Ok(HttpResponse::Ok().json(json!({
      "message": "Product updated successfully.",
      "product": product
  })))
}

#[instrument(name = "handler::delete_product", skip(app_state, path, _admin), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  app_state.products.delete(path.into_inner()).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::attach_images", skip(app_state, path, payload, _admin), fields(product_id = %path.as_ref()))]
pub async fn attach_images_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<AttachImagesPayload>,
  _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let images = app_state
    .images
    .attach_images(path.into_inner(), payload.into_inner().urls)
    .await?;
  Ok(HttpResponse::Created().json(json!({ "images": images })))
}

#[instrument(name = "handler::list_images", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn list_images_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let images = app_state.images.list_images(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({ "images": images })))
}
