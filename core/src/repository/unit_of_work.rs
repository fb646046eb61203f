// core/src/repository/unit_of_work.rs

//! Transaction boundary spanning several repositories.
//!
//! A [`TransactionalStore`] opens scopes; a scope is a [`RepositoryProvider`]
//! whose repositories all read and write through the same transaction, so
//! work done early in a scope is visible later in that scope and invisible to
//! everyone else until commit.
//!
//! Scopes are owned values. Dropping one without calling
//! [`RepositoryProvider::commit`] discards everything it staged, which is what
//! makes rollback hold on panics and on cancelled futures as well as on
//! returned errors.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tracing::{debug, instrument, warn};

use super::{OrderRepository, ProductImageRepository, ProductRepository};
use crate::error::StorefrontResult;

/// One open transaction and the repositories bound to it.
#[async_trait]
pub trait RepositoryProvider: Send {
  fn products(&mut self) -> &mut dyn ProductRepository;

  fn orders(&mut self) -> &mut dyn OrderRepository;

  fn images(&mut self) -> &mut dyn ProductImageRepository;

  async fn commit(self: Box<Self>) -> StorefrontResult<()>;

  async fn rollback(self: Box<Self>) -> StorefrontResult<()>;
}

/// A store able to open transaction scopes.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
  async fn begin(&self) -> StorefrontResult<Box<dyn RepositoryProvider>>;
}

/// Runs caller-supplied work inside a single transaction scope.
///
/// Cheap to clone; clones share the underlying store.
#[derive(Clone)]
pub struct UnitOfWork {
  store: Arc<dyn TransactionalStore>,
}

impl UnitOfWork {
  pub fn new(store: Arc<dyn TransactionalStore>) -> Self {
    Self { store }
  }

  /// Opens a scope, hands it to `work`, and commits if `work` succeeds.
  ///
  /// Any error from `work` rolls the scope back and is returned unchanged. A
  /// failed commit is returned as is; nothing is retried here.
  #[instrument(name = "unit_of_work::execute", skip_all)]
  pub async fn execute<T, F>(&self, work: F) -> StorefrontResult<T>
  where
    T: Send,
    F: for<'t> FnOnce(&'t mut dyn RepositoryProvider) -> BoxFuture<'t, StorefrontResult<T>> + Send,
  {
    let mut scope = self.store.begin().await?;
    debug!("Transaction scope opened.");

    let outcome = work(scope.as_mut()).await;

    match outcome {
      Ok(value) => {
        scope.commit().await?;
        debug!("Transaction scope committed.");
        Ok(value)
      }
      Err(err) => {
        if let Err(rollback_err) = scope.rollback().await {
          // The work error is what the caller needs to branch on.
          warn!(error = %rollback_err, "Rollback failed after work error; scope discarded.");
        }
        debug!(error = %err, "Transaction scope rolled back.");
        Err(err)
      }
    }
  }
}

impl fmt::Debug for UnitOfWork {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("UnitOfWork").finish_non_exhaustive()
  }
}
