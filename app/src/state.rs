// app/src/state.rs
use std::sync::Arc;

use storefront::{
  ImageService, MemoryStore, OrderService, PgStore, ProductService, RateLimiter, TransactionalStore, TtlCache,
  UnitOfWork,
};
use tracing::info;

use crate::config::{AppConfig, StorageBackend};
use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppState {
  pub products: ProductService,
  pub orders: OrderService,
  pub images: ImageService,
  pub rate_limiter: Option<Arc<RateLimiter>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Opens the configured store (running migrations if asked to) and wires
  /// the services over it.
  pub async fn from_config(config: AppConfig) -> Result<Self> {
    let store: Arc<dyn TransactionalStore> = match config.storage_backend {
      StorageBackend::Postgres => {
        let url = config
          .database_url
          .as_deref()
          .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres backend".to_string()))?;
        let store = PgStore::connect(url, config.database_max_connections).await?;
        info!("Successfully connected to the database.");
        if config.run_migrations {
          store.migrate().await?;
          info!("Database migrations applied.");
        }
        Arc::new(store)
      }
      StorageBackend::Memory => {
        info!("Using the in-memory store; data will not survive a restart.");
        Arc::new(MemoryStore::new())
      }
    };

    Ok(Self::with_store(store, config))
  }

  pub fn with_store(store: Arc<dyn TransactionalStore>, config: AppConfig) -> Self {
    let uow = UnitOfWork::new(store);
    let listing_cache = config
      .cache_enabled
      .then(|| Arc::new(TtlCache::new(config.cache_ttl, config.cache_max_entries)));
    let rate_limiter = config
      .rate_limit_enabled
      .then(|| Arc::new(RateLimiter::new(config.rate_limit_max_requests, config.rate_limit_window)));

    Self {
      products: ProductService::new(uow.clone(), listing_cache),
      orders: OrderService::new(uow.clone()),
      images: ImageService::new(uow),
      rate_limiter,
      config: Arc::new(config),
    }
  }
}
