// app/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use storefront::{ErrorCategory, StorefrontError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Storefront(#[from] StorefrontError),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Too many requests")]
  RateLimited,
}

impl AppError {
  /// Message safe to hand back to the client. Infrastructure details stay in
  /// the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Storefront(err) => match (err.category(), err) {
        (ErrorCategory::Infrastructure, _) => "An internal error occurred".to_string(),
        (_, StorefrontError::Validation(m)) | (_, StorefrontError::NotFound(m)) => m.clone(),
        (_, other) => other.to_string(),
      },
      AppError::Auth(m) | AppError::Forbidden(m) => m.clone(),
      AppError::RateLimited => "Too many requests, please try again later".to_string(),
      AppError::Config(_) => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Storefront(err) => match err.category() {
        ErrorCategory::Validation => StatusCode::BAD_REQUEST,
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Conflict => StatusCode::CONFLICT,
        ErrorCategory::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
      AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Request rejected");
    }
    HttpResponse::build(status).json(json!({ "error": self.public_message() }))
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
