// core/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;
use uuid::Uuid;

/// Coarse classification of a [`StorefrontError`], used by request-handling
/// layers to pick a response without matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
  /// Malformed or empty input.
  Validation,
  /// A referenced entity does not exist.
  NotFound,
  /// The request is well formed but conflicts with current state.
  Conflict,
  /// The backing store or some other collaborator failed.
  Infrastructure,
}

#[derive(Debug, Error)]
pub enum StorefrontError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("insufficient stock for product '{product_name}' ({product_id}): requested {requested}, available {available}")]
  InsufficientStock {
    product_id: Uuid,
    product_name: String,
    available: i32,
    requested: i32,
  },

  #[error("cannot delete product {product_id}: product has pending orders")]
  ProductHasPendingOrders { product_id: Uuid },

  #[error("Database Error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Infrastructure Error: {source}")]
  Infrastructure {
    #[source]
    source: AnyhowError,
  },
}

impl StorefrontError {
  pub fn category(&self) -> ErrorCategory {
    match self {
      StorefrontError::Validation(_) => ErrorCategory::Validation,
      StorefrontError::NotFound(_) => ErrorCategory::NotFound,
      StorefrontError::InsufficientStock { .. } | StorefrontError::ProductHasPendingOrders { .. } => {
        ErrorCategory::Conflict
      }
      StorefrontError::Database(_) | StorefrontError::Infrastructure { .. } => ErrorCategory::Infrastructure,
    }
  }

  pub(crate) fn product_not_found(product_id: Uuid) -> Self {
    StorefrontError::NotFound(format!("product {} not found", product_id))
  }
}

impl From<AnyhowError> for StorefrontError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a StorefrontError that was only boxed for transport through anyhow.
    match err.downcast::<StorefrontError>() {
      Ok(inner) => inner,
      Err(source) => StorefrontError::Infrastructure { source },
    }
  }
}

impl From<sqlx::migrate::MigrateError> for StorefrontError {
  fn from(err: sqlx::migrate::MigrateError) -> Self {
    StorefrontError::Infrastructure {
      source: AnyhowError::new(err).context("applying database migrations"),
    }
  }
}

pub type StorefrontResult<T, E = StorefrontError> = std::result::Result<T, E>;
