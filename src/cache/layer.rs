//! Two-tier cache: an in-process map in front of persistent storage.

use chrono::{DateTime, Duration, Utc};
use color_eyre::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use super::storage::CacheStorage;
use super::traits::{CacheEntry, QueryKey};

/// Default lifetime of a cache entry.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Read-through cache with time-based expiry.
///
/// Reads check memory first, then persistent storage, promoting fresh
/// persistent hits into memory. Writes go to both tiers; a failed persistent
/// write is logged and otherwise ignored.
pub struct CacheLayer<S: CacheStorage> {
  memory: Arc<Mutex<HashMap<String, CacheEntry>>>,
  storage: Arc<S>,
  /// How long before cached data is considered expired
  ttl: Duration,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S) -> Self {
    Self {
      memory: Arc::new(Mutex::new(HashMap::new())),
      storage: Arc::new(storage),
      ttl: Duration::hours(DEFAULT_TTL_HOURS),
    }
  }

  /// Set the time-to-live for cached data.
  pub fn with_ttl(mut self, ttl: Duration) -> Self {
    self.ttl = ttl;
    self
  }

  fn is_expired(&self, stored_at: DateTime<Utc>) -> bool {
    Utc::now() - stored_at > self.ttl
  }

  fn memory(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
    // A poisoned map still holds valid entries
    self.memory.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Look up a payload, returning `None` when absent or expired.
  pub fn get<K: QueryKey>(&self, key: &K) -> Option<serde_json::Value> {
    let hash = key.cache_hash();

    {
      let mut memory = self.memory();
      if let Some(entry) = memory.get(&hash) {
        if !self.is_expired(entry.stored_at) {
          debug!(key = %key.normalized(), "memory cache hit");
          return Some(entry.payload.clone());
        }
        memory.remove(&hash);
      }
    }

    let raw = match self.storage.read(&hash) {
      Ok(Some(raw)) => raw,
      Ok(None) => return None,
      Err(e) => {
        warn!(key = %key.normalized(), error = %e, "persistent cache read failed");
        return None;
      }
    };

    let entry: CacheEntry = match serde_json::from_str(&raw) {
      Ok(entry) => entry,
      Err(e) => {
        warn!(key = %key.normalized(), error = %e, "dropping undecodable cache entry");
        self.remove_persistent(&hash);
        return None;
      }
    };

    if self.is_expired(entry.stored_at) {
      debug!(key = %key.normalized(), "persistent cache entry expired");
      self.remove_persistent(&hash);
      return None;
    }

    debug!(key = %key.normalized(), "persistent cache hit");
    let payload = entry.payload.clone();
    self.memory().insert(hash, entry);
    Some(payload)
  }

  /// Store a payload in both tiers. Never fails.
  pub fn set<K: QueryKey>(&self, key: &K, payload: serde_json::Value) {
    let hash = key.cache_hash();
    let entry = CacheEntry::new(payload);

    match serde_json::to_string(&entry) {
      Ok(raw) => {
        if let Err(e) = self.storage.write(&hash, &raw) {
          warn!(key = %key.normalized(), error = %e, "persistent cache write failed");
        }
      }
      Err(e) => warn!(key = %key.normalized(), error = %e, "failed to encode cache entry"),
    }

    self.memory().insert(hash, entry);
  }

  /// Empty both tiers. Memory is always cleared, even if storage fails.
  pub fn clear(&self) -> Result<()> {
    self.memory().clear();
    self.storage.clear()
  }

  fn remove_persistent(&self, hash: &str) {
    if let Err(e) = self.storage.remove(hash) {
      warn!(error = %e, "failed to remove persistent cache entry");
    }
  }

  #[cfg(test)]
  fn storage(&self) -> &S {
    &self.storage
  }

  #[cfg(test)]
  fn memory_len(&self) -> usize {
    self.memory().len()
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      memory: Arc::clone(&self.memory),
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::SqliteStorage;
  use serde_json::json;

  struct Key(&'static str);

  impl QueryKey for Key {
    fn normalized(&self) -> String {
      self.0.to_string()
    }
  }

  fn layer() -> CacheLayer<SqliteStorage> {
    CacheLayer::new(SqliteStorage::open_in_memory("test").unwrap())
  }

  /// Write an entry straight into persistent storage with the given age.
  fn seed(storage: &SqliteStorage, key: &Key, age: Duration) {
    let entry = CacheEntry {
      payload: json!({"Title": "Old"}),
      stored_at: Utc::now() - age,
    };
    storage
      .write(&key.cache_hash(), &serde_json::to_string(&entry).unwrap())
      .unwrap();
  }

  #[test]
  fn test_set_then_get_returns_value() {
    let cache = layer();
    let value = json!({"Search": [{"imdbID": "tt1"}], "totalResults": "1"});

    cache.set(&Key("search:batman:1"), value.clone());

    assert_eq!(cache.get(&Key("search:batman:1")), Some(value));
  }

  #[test]
  fn test_get_missing_is_none() {
    assert_eq!(layer().get(&Key("nothing")), None);
  }

  #[test]
  fn test_fresh_persistent_entry_is_promoted() {
    let storage = SqliteStorage::open_in_memory("test").unwrap();
    let key = Key("detail:tt1");
    seed(&storage, &key, Duration::hours(1));

    let cache = CacheLayer::new(storage);
    assert_eq!(cache.memory_len(), 0);

    assert_eq!(cache.get(&key), Some(json!({"Title": "Old"})));
    assert_eq!(cache.memory_len(), 1);
  }

  #[test]
  fn test_expired_persistent_entry_is_removed() {
    let storage = SqliteStorage::open_in_memory("test").unwrap();
    let key = Key("detail:tt1");
    seed(&storage, &key, Duration::hours(25));

    let cache = CacheLayer::new(storage);

    assert_eq!(cache.get(&key), None);
    assert_eq!(cache.storage().read(&key.cache_hash()).unwrap(), None);
    assert_eq!(cache.get(&key), None);
  }

  #[test]
  fn test_expired_memory_entry_is_not_served() {
    let cache = layer().with_ttl(Duration::zero());
    let key = Key("search:heat:1");
    cache.set(&key, json!({"Search": []}));

    std::thread::sleep(std::time::Duration::from_millis(5));

    assert_eq!(cache.get(&key), None);
    assert_eq!(cache.memory_len(), 0);
  }

  #[test]
  fn test_undecodable_entry_is_dropped() {
    let storage = SqliteStorage::open_in_memory("test").unwrap();
    let key = Key("detail:tt2");
    storage.write(&key.cache_hash(), "not json").unwrap();

    let cache = CacheLayer::new(storage);

    assert_eq!(cache.get(&key), None);
    assert_eq!(cache.storage().read(&key.cache_hash()).unwrap(), None);
  }

  #[test]
  fn test_clear_empties_both_tiers() {
    let cache = layer();
    let keys = [Key("a"), Key("b"), Key("c")];
    for key in &keys {
      cache.set(key, json!(key.0));
    }

    cache.clear().unwrap();

    assert_eq!(cache.memory_len(), 0);
    for key in &keys {
      assert_eq!(cache.get(key), None);
      assert_eq!(cache.storage().read(&key.cache_hash()).unwrap(), None);
    }
  }

  #[test]
  fn test_failed_persistent_write_keeps_memory() {
    let storage = SqliteStorage::open_in_memory("test")
      .unwrap()
      .with_quota(8);
    let cache = CacheLayer::new(storage);
    let key = Key("search:alien:1");
    let value = json!({"Search": [{"imdbID": "tt0078748", "Title": "Alien"}]});

    cache.set(&key, value.clone());

    assert_eq!(cache.storage().read(&key.cache_hash()).unwrap(), None);
    assert_eq!(cache.get(&key), Some(value));
  }

  #[test]
  fn test_clones_share_tiers() {
    let cache = layer();
    let other = cache.clone();

    cache.set(&Key("shared"), json!(1));

    assert_eq!(other.get(&Key("shared")), Some(json!(1)));
  }
}
