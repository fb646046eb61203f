// app/tests/api_tests.rs

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::{test, web, App};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use storefront::MemoryStore;
use storefront_app::config::{AppConfig, StorageBackend};
use storefront_app::state::AppState;
use storefront_app::web::{configure_app_routes, middleware::rate_limit};
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

fn memory_config() -> AppConfig {
  AppConfig {
    storage_backend: StorageBackend::Memory,
    cache_enabled: false,
    rate_limit_max_requests: 1_000,
    ..Default::default()
  }
}

fn memory_state(config: AppConfig) -> AppState {
  AppState::with_store(Arc::new(MemoryStore::new()), config)
}

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state))
        .wrap(from_fn(rate_limit))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn peer() -> SocketAddr {
  "10.1.2.3:40000".parse().unwrap()
}

fn as_admin(req: test::TestRequest, admin_id: Uuid) -> test::TestRequest {
  req
    .peer_addr(peer())
    .insert_header(("X-User-ID", admin_id.to_string()))
    .insert_header(("X-User-Role", "admin"))
}

fn as_user(req: test::TestRequest, user_id: Uuid) -> test::TestRequest {
  req
    .peer_addr(peer())
    .insert_header(("X-User-ID", user_id.to_string()))
    .insert_header(("X-User-Role", "user"))
}

fn product_body(name: &str, price_cents: i64, stock: i32) -> Value {
  json!({
    "name": name,
    "description": format!("{} sold through the api tests", name),
    "priceCents": price_cents,
    "stock": stock,
    "category": "kitchen",
  })
}

fn order_body(product_id: &str, quantity: i32) -> Value {
  json!({
    "description": "weekly restock",
    "items": [{ "productId": product_id, "quantity": quantity }],
  })
}

#[actix_rt::test]
async fn test_health_check() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));

  let req = test::TestRequest::get().uri("/api/v1/health").peer_addr(peer()).to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;

  assert_eq!(body["status"], "ok");
}

#[actix_rt::test]
async fn test_order_flow_decrements_stock_and_lists_orders() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));
  let admin = Uuid::new_v4();
  let user = Uuid::new_v4();

  let req = as_admin(test::TestRequest::post().uri("/api/v1/products"), admin)
    .set_json(product_body("Cast Iron Pan", 3_500, 5))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let created: Value = test::read_body_json(resp).await;
  let product_id = created["product"]["id"].as_str().unwrap().to_string();
  assert_eq!(created["product"]["ownerId"], admin.to_string());

  let req = as_user(test::TestRequest::post().uri("/api/v1/orders"), user)
    .set_json(order_body(&product_id, 3))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let placed: Value = test::read_body_json(resp).await;
  assert_eq!(placed["order"]["status"], "pending");
  assert_eq!(placed["order"]["totalPriceCents"], 3 * 3_500);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/products/{}", product_id))
    .peer_addr(peer())
    .to_request();
  let fetched: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(fetched["product"]["stock"], 2);

  let req = as_user(test::TestRequest::get().uri("/api/v1/orders"), user).to_request();
  let listed: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(listed["orders"].as_array().map(Vec::len), Some(1));
  assert_eq!(listed["orders"][0]["items"][0]["unitPriceCents"], 3_500);
}

#[actix_rt::test]
async fn test_insufficient_stock_is_conflict_and_changes_nothing() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));

  let req = as_admin(test::TestRequest::post().uri("/api/v1/products"), Uuid::new_v4())
    .set_json(product_body("Dutch Oven", 9_000, 2))
    .to_request();
  let created: Value = test::call_and_read_body_json(&app, req).await;
  let product_id = created["product"]["id"].as_str().unwrap().to_string();

  let user = Uuid::new_v4();
  let req = as_user(test::TestRequest::post().uri("/api/v1/orders"), user)
    .set_json(order_body(&product_id, 3))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].as_str().unwrap().contains("insufficient stock"));

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/products/{}", product_id))
    .peer_addr(peer())
    .to_request();
  let fetched: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(fetched["product"]["stock"], 2);

  let req = as_user(test::TestRequest::get().uri("/api/v1/orders"), user).to_request();
  let listed: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(listed["orders"].as_array().map(Vec::len), Some(0));
}

#[actix_rt::test]
async fn test_delete_blocked_by_pending_order_then_allowed_for_unreferenced_product() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));
  let admin = Uuid::new_v4();

  let mut ids = Vec::new();
  for name in ["Chef Knife", "Cutting Board"] {
    let req = as_admin(test::TestRequest::post().uri("/api/v1/products"), admin)
      .set_json(product_body(name, 4_200, 10))
      .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    ids.push(created["product"]["id"].as_str().unwrap().to_string());
  }

  let req = as_user(test::TestRequest::post().uri("/api/v1/orders"), Uuid::new_v4())
    .set_json(order_body(&ids[0], 1))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  let req = as_admin(test::TestRequest::delete().uri(&format!("/api/v1/products/{}", ids[0])), admin).to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

  let req = as_admin(test::TestRequest::delete().uri(&format!("/api/v1/products/{}", ids[1])), admin).to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

  let req = as_admin(test::TestRequest::delete().uri(&format!("/api/v1/products/{}", ids[1])), admin).to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

  let req = test::TestRequest::get()
    .uri(&format!("/api/v1/products/{}", ids[0]))
    .peer_addr(peer())
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_identity_and_role_checks() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));

  let req = as_user(test::TestRequest::post().uri("/api/v1/products"), Uuid::new_v4())
    .set_json(product_body("Whisk", 900, 3))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

  let req = test::TestRequest::post()
    .uri("/api/v1/orders")
    .peer_addr(peer())
    .set_json(order_body(&Uuid::new_v4().to_string(), 1))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get()
    .uri("/api/v1/orders")
    .peer_addr(peer())
    .insert_header(("X-User-ID", Uuid::new_v4().to_string()))
    .insert_header(("X-User-Role", "superuser"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

  let req = test::TestRequest::get()
    .uri("/api/v1/orders")
    .peer_addr(peer())
    .insert_header(("X-User-ID", "not-a-uuid"))
    .insert_header(("X-User-Role", "user"))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_validation_failures_are_bad_requests() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));
  let user = Uuid::new_v4();

  let req = as_user(test::TestRequest::post().uri("/api/v1/orders"), user)
    .set_json(json!({ "description": "nothing", "items": [] }))
    .to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].is_string());

  let req = as_user(test::TestRequest::post().uri("/api/v1/orders"), user)
    .insert_header(("content-type", "application/json"))
    .set_payload("{ not json")
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = as_admin(test::TestRequest::post().uri("/api/v1/products"), Uuid::new_v4())
    .set_json(product_body("Pot", 0, 1))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = as_user(test::TestRequest::post().uri("/api/v1/orders"), user)
    .set_json(order_body(&Uuid::new_v4().to_string(), 1))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn test_responses_use_camel_case_keys_like_requests() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));
  let admin = Uuid::new_v4();
  let user = Uuid::new_v4();

  let req = as_admin(test::TestRequest::post().uri("/api/v1/products"), admin)
    .set_json(product_body("Whisk", 800, 3))
    .to_request();
  let created: Value = test::call_and_read_body_json(&app, req).await;
  let product = &created["product"];
  assert_eq!(product["priceCents"], 800);
  for key in ["ownerId", "createdAt", "updatedAt"] {
    assert!(product.get(key).is_some(), "product is missing {}", key);
  }
  assert!(product.get("price_cents").is_none());
  assert!(product.get("owner_id").is_none());

  let product_id = product["id"].as_str().unwrap().to_string();
  let req = as_admin(test::TestRequest::post().uri(&format!("/api/v1/products/{}/images", product_id)), admin)
    .set_json(json!({ "urls": ["https://cdn.test/whisk.jpg"] }))
    .to_request();
  let images: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(images["images"][0]["productId"], product_id.as_str());

  let req = as_user(test::TestRequest::post().uri("/api/v1/orders"), user)
    .set_json(order_body(&product_id, 1))
    .to_request();
  let placed: Value = test::call_and_read_body_json(&app, req).await;
  let order = &placed["order"];
  assert_eq!(order["userId"], user.to_string());
  assert_eq!(order["totalPriceCents"], 800);
  assert!(order.get("total_price_cents").is_none());
  assert_eq!(order["items"][0]["productId"], product_id.as_str());
  assert_eq!(order["items"][0]["orderId"], order["id"]);
  assert!(order["items"][0].get("unit_price_cents").is_none());
}

#[actix_rt::test]
async fn test_images_attach_and_list() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));
  let admin = Uuid::new_v4();

  let req = as_admin(test::TestRequest::post().uri("/api/v1/products"), admin)
    .set_json(product_body("Spice Rack", 2_100, 4))
    .to_request();
  let created: Value = test::call_and_read_body_json(&app, req).await;
  let product_id = created["product"]["id"].as_str().unwrap().to_string();
  let images_uri = format!("/api/v1/products/{}/images", product_id);

  let req = as_admin(test::TestRequest::post().uri(&images_uri), admin)
    .set_json(json!({ "urls": ["https://cdn.test/rack-1.jpg", "https://cdn.test/rack-2.jpg"] }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

  let req = as_admin(test::TestRequest::post().uri(&images_uri), admin)
    .set_json(json!({ "urls": ["a", "b", "c"] }))
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

  let req = test::TestRequest::get().uri(&images_uri).peer_addr(peer()).to_request();
  let listed: Value = test::call_and_read_body_json(&app, req).await;
  assert_eq!(listed["images"].as_array().map(Vec::len), Some(2));
}

#[actix_rt::test]
async fn test_listing_pagination_and_search() {
  setup_tracing();
  let app = init_app!(memory_state(memory_config()));
  let admin = Uuid::new_v4();

  for name in ["Salad Bowl", "Soup Bowl", "Ladle"] {
    let req = as_admin(test::TestRequest::post().uri("/api/v1/products"), admin)
      .set_json(product_body(name, 1_000, 1))
      .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
  }

  let req = test::TestRequest::get()
    .uri("/api/v1/products?search=bowl&page=1&limit=1")
    .peer_addr(peer())
    .to_request();
  let body: Value = test::call_and_read_body_json(&app, req).await;

  assert_eq!(body["total"], 2);
  assert_eq!(body["products"].as_array().map(Vec::len), Some(1));
  assert_eq!(body["products"][0]["name"], "Soup Bowl");
}

#[actix_rt::test]
async fn test_rate_limit_answers_too_many_requests() {
  setup_tracing();
  let config = AppConfig {
    rate_limit_max_requests: 3,
    ..memory_config()
  };
  let app = init_app!(memory_state(config));

  for _ in 0..3 {
    let req = test::TestRequest::get().uri("/api/v1/health").peer_addr(peer()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
  }

  let req = test::TestRequest::get().uri("/api/v1/health").peer_addr(peer()).to_request();
  let resp = test::call_service(&app, req).await;
  assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
  let body: Value = test::read_body_json(resp).await;
  assert!(body["error"].is_string());

  let other_client: SocketAddr = "10.9.9.9:40000".parse().unwrap();
  let req = test::TestRequest::get()
    .uri("/api/v1/health")
    .peer_addr(other_client)
    .to_request();
  assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn test_rate_limit_ignores_forwarded_headers_from_one_peer() {
  setup_tracing();
  let config = AppConfig {
    rate_limit_max_requests: 3,
    ..memory_config()
  };
  let app = init_app!(memory_state(config));

  let mut admitted = 0;
  for n in 0..20 {
    let req = test::TestRequest::get()
      .uri("/api/v1/health")
      .peer_addr(peer())
      .insert_header(("X-Forwarded-For", format!("203.0.113.{}", n)))
      .insert_header(("Forwarded", format!("for=198.51.100.{}", n)))
      .to_request();
    if test::call_service(&app, req).await.status() == StatusCode::OK {
      admitted += 1;
    }
  }

  assert_eq!(admitted, 3);
}

#[actix_rt::test]
async fn test_rate_limit_disabled_lets_everything_through() {
  setup_tracing();
  let config = AppConfig {
    rate_limit_enabled: false,
    rate_limit_max_requests: 1,
    ..memory_config()
  };
  let app = init_app!(memory_state(config));

  for _ in 0..5 {
    let req = test::TestRequest::get().uri("/api/v1/health").peer_addr(peer()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
  }
}
