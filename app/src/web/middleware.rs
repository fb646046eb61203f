// app/src/web/middleware.rs

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, Error, ResponseError};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Per-client request ceiling, keyed on the IP of the socket peer.
/// Forwarded headers are client-controlled and never used as the key. Passes
/// every request through when the app runs without a limiter.
pub async fn rate_limit(
  req: ServiceRequest,
  next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
  let limiter = req
    .app_data::<web::Data<AppState>>()
    .and_then(|state| state.rate_limiter.clone());

  if let Some(limiter) = limiter {
    let client_key = client_key(&req);

    if !limiter.allow(&client_key) {
      warn!(client = %client_key, path = %req.path(), "Rate limit exceeded.");
      let response = AppError::RateLimited.error_response();
      return Ok(req.into_response(response).map_into_right_body());
    }
  }

  next.call(req).await.map(ServiceResponse::map_into_left_body)
}

fn client_key(req: &ServiceRequest) -> String {
  req
    .peer_addr()
    .map(|addr| addr.ip().to_string())
    .unwrap_or_else(|| "unknown".to_string())
}
