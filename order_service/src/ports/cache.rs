// order_service/src/ports/cache.rs

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A failed cache call. Never fatal: callers log it and fall back to the store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cache degraded: {0}")]
pub struct CacheError(pub String);

/// Key-value store with expiring entries, used for per-product order listings.
#[async_trait]
pub trait ListingCache: Send + Sync {
  /// `Ok(None)` for a key that is absent or expired.
  async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

  async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

  async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

struct Entry {
  value: String,
  expires_at: Instant,
}

/// Process-local cache. Expired entries are evicted when they are next read.
#[derive(Default)]
pub struct InMemoryListingCache {
  entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryListingCache {
  pub fn new() -> Self {
    Self::default()
  }

  fn get_at(&self, key: &str, now: Instant) -> Option<String> {
    let mut entries = self.entries.lock();
    match entries.get(key) {
      Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
      Some(_) => {
        entries.remove(key);
        None
      }
      None => None,
    }
  }

  fn set_at(&self, key: &str, value: String, ttl: Duration, now: Instant) {
    self.entries.lock().insert(
      key.to_string(),
      Entry {
        value,
        expires_at: now + ttl,
      },
    );
  }
}

#[async_trait]
impl ListingCache for InMemoryListingCache {
  async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
    Ok(self.get_at(key, Instant::now()))
  }

  async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
    self.set_at(key, value, ttl, Instant::now());
    Ok(())
  }

  async fn delete(&self, key: &str) -> Result<(), CacheError> {
    self.entries.lock().remove(key);
    Ok(())
  }
}
