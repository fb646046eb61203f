// src/lib.rs

//! Storefront: the transactional core of a multi-tenant order-processing
//! backend.
//!
//! The crate provides:
//!  - A [`UnitOfWork`] that runs caller-supplied work against product, order
//!    and image repositories bound to one transaction, committing on success
//!    and rolling back on error, panic or cancellation.
//!  - [`OrderService::place_order`], which converts a cart into a `pending`
//!    order while re-reading and decrementing stock inside that transaction.
//!  - [`ProductService::delete`], guarded so a product referenced by a
//!    pending order cannot be removed.
//!  - Two store backends: [`PgStore`] (Postgres via `sqlx`) and
//!    [`MemoryStore`] (in-process, serialized transactions).
//!  - The collaborators guarding the read path and API surface: a bounded
//!    [`TtlCache`] and a sliding-window [`RateLimiter`].

pub mod cache;
pub mod error;
pub mod models;
pub mod rate_limit;
pub mod repository;
pub mod services;
pub mod store;

pub use crate::cache::{TtlCache, DEFAULT_CACHE_CAPACITY};
pub use crate::error::{ErrorCategory, StorefrontError, StorefrontResult};
pub use crate::models::{Order, OrderItem, OrderStatus, Product, ProductImage};
pub use crate::rate_limit::RateLimiter;
pub use crate::repository::{
  OrderRepository, ProductFilter, ProductImageRepository, ProductPage, ProductRepository, RepositoryProvider,
  TransactionalStore, UnitOfWork,
};
pub use crate::services::{
  CreateProductInput, ImageService, ListProductsInput, OrderLineInput, OrderService, PlaceOrderInput, ProductService,
  UpdateProductInput,
};
pub use crate::store::{MemoryStore, PgStore};

/*
    Typical wiring:
    1. Build a store (`PgStore::connect(..)` then `migrate()`, or `MemoryStore::new()`).
    2. Wrap it: `UnitOfWork::new(Arc::new(store))`.
    3. Construct services from clones of the unit of work, passing the listing
       cache to `ProductService`.
    4. Share the services and the `RateLimiter` with request handlers.
*/
