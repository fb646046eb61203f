// core/src/cache.rs

//! Bounded TTL cache for the product-listing read path.
//!
//! Only listings go through here. Stock checks, order placement and the
//! pending-order guard always read the store directly.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Capacity used when a cache is built with a capacity of zero.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

struct CacheEntry<V> {
  value: V,
  expires_at: Instant,
}

pub struct TtlCache<V> {
  entries: Mutex<HashMap<String, CacheEntry<V>>>,
  ttl: Duration,
  capacity: usize,
}

impl<V: Clone> TtlCache<V> {
  pub fn new(ttl: Duration, capacity: usize) -> Self {
    let capacity = if capacity == 0 { DEFAULT_CACHE_CAPACITY } else { capacity };
    Self {
      entries: Mutex::new(HashMap::with_capacity(capacity)),
      ttl,
      capacity,
    }
  }

  pub fn get(&self, key: &str) -> Option<V> {
    self.get_at(key, Instant::now())
  }

  /// Returns the value if it was stored and has not expired as of `now`.
  /// Expired entries are left in place; [`set_at`](Self::set_at) reclaims
  /// them when space runs out.
  pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
    let entries = self.entries.lock();
    let entry = entries.get(key)?;
    if now > entry.expires_at {
      return None;
    }
    Some(entry.value.clone())
  }

  pub fn set(&self, key: impl Into<String>, value: V) -> bool {
    self.set_at(key, value, Instant::now())
  }

  /// Stores `value` under `key`, expiring `ttl` after `now`.
  ///
  /// When the cache is full, expired entries are purged first; if it is still
  /// full the new key is not stored and `false` is returned. Overwriting a key
  /// that is already present always succeeds.
  pub fn set_at(&self, key: impl Into<String>, value: V, now: Instant) -> bool {
    let key = key.into();
    let mut entries = self.entries.lock();

    if entries.len() >= self.capacity && !entries.contains_key(&key) {
      entries.retain(|_, entry| now <= entry.expires_at);
      if entries.len() >= self.capacity {
        return false;
      }
    }

    entries.insert(
      key,
      CacheEntry {
        value,
        expires_at: now + self.ttl,
      },
    );
    true
  }

  /// Number of stored entries, expired ones included.
  pub fn len(&self) -> usize {
    self.entries.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }
}

impl<V> fmt::Debug for TtlCache<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TtlCache")
      .field("ttl", &self.ttl)
      .field("capacity", &self.capacity)
      .finish_non_exhaustive()
  }
}
