//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Trait for query descriptions that can be turned into a cache key.
///
/// Two queries that normalize to the same string share a cache entry.
pub trait QueryKey {
  /// Normalized, human-readable form of the key (e.g. "search:batman:1")
  fn normalized(&self) -> String;

  /// Stable, fixed-length key used by both cache tiers.
  fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.normalized().as_bytes());
    hex::encode(hasher.finalize())
  }
}

/// A cached payload together with the time it was stored.
///
/// Persisted as JSON `{"payload": ..., "storedAt": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
  /// Opaque response body, passed through untouched
  pub payload: serde_json::Value,
  /// When the entry was written
  pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
  /// Create an entry stamped with the current time.
  pub fn new(payload: serde_json::Value) -> Self {
    Self {
      payload,
      stored_at: Utc::now(),
    }
  }
}
