//! Persistent cache storage trait and SQLite implementation.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Namespace under which this application keeps its entries.
pub const DEFAULT_NAMESPACE: &str = "cinesearch";

/// Trait for persistent key/value text storage backends.
///
/// Every backend is scoped to a namespace: `clear` must leave entries of
/// other namespaces untouched.
pub trait CacheStorage: Send + Sync {
  /// Read the raw value stored under `key`.
  fn read(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn write(&self, key: &str, value: &str) -> Result<()>;

  /// Remove a single entry.
  fn remove(&self, key: &str) -> Result<()>;

  /// Remove every entry in this namespace.
  fn clear(&self) -> Result<()>;
}

impl<S: CacheStorage + ?Sized> CacheStorage for Box<S> {
  fn read(&self, key: &str) -> Result<Option<String>> {
    (**self).read(key)
  }

  fn write(&self, key: &str, value: &str) -> Result<()> {
    (**self).write(key, value)
  }

  fn remove(&self, key: &str) -> Result<()> {
    (**self).remove(key)
  }

  fn clear(&self) -> Result<()> {
    (**self).clear()
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn read(&self, _key: &str) -> Result<Option<String>> {
    Ok(None) // Always miss
  }

  fn write(&self, _key: &str, _value: &str) -> Result<()> {
    Ok(()) // Discard
  }

  fn remove(&self, _key: &str) -> Result<()> {
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    Ok(())
  }
}

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
  namespace: String,
  /// Upper bound on the total size of stored values, across all namespaces
  quota_bytes: Option<u64>,
}

impl SqliteStorage {
  /// Open storage at `path`, or at the default location when `None`.
  pub fn open(path: Option<&Path>, namespace: &str) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn, namespace)
  }

  /// Open a throwaway in-memory store.
  #[allow(dead_code)]
  pub fn open_in_memory(namespace: &str) -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::with_connection(conn, namespace)
  }

  fn with_connection(conn: Connection, namespace: &str) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
      namespace: namespace.to_string(),
      quota_bytes: None,
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// Limit the total size of stored values. Writes beyond it fail.
  pub fn with_quota(mut self, quota_bytes: u64) -> Self {
    self.quota_bytes = Some(quota_bytes);
    self
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("cinesearch").join("cache.db"))
  }

  /// Run database migrations for cache tables.
  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
-- Namespaced key/value text storage
CREATE TABLE IF NOT EXISTS kv_store (
    namespace TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (namespace, key)
);
"#;

impl CacheStorage for SqliteStorage {
  fn read(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;

    conn
      .query_row(
        "SELECT value FROM kv_store WHERE namespace = ? AND key = ?",
        params![self.namespace, key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read cache entry: {}", e))
  }

  fn write(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock()?;

    if let Some(quota) = self.quota_bytes {
      // Size of everything else, so that replacing an entry is measured correctly
      let used: i64 = conn
        .query_row(
          "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv_store
           WHERE NOT (namespace = ? AND key = ?)",
          params![self.namespace, key],
          |row| row.get(0),
        )
        .map_err(|e| eyre!("Failed to measure cache size: {}", e))?;

      let needed = used as u64 + value.len() as u64;
      if needed > quota {
        return Err(eyre!(
          "Storage quota exceeded: {} bytes needed, {} allowed",
          needed,
          quota
        ));
      }
    }

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (namespace, key, value) VALUES (?, ?, ?)",
        params![self.namespace, key, value],
      )
      .map_err(|e| eyre!("Failed to store cache entry: {}", e))?;

    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "DELETE FROM kv_store WHERE namespace = ? AND key = ?",
        params![self.namespace, key],
      )
      .map_err(|e| eyre!("Failed to remove cache entry: {}", e))?;

    Ok(())
  }

  fn clear(&self) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "DELETE FROM kv_store WHERE namespace = ?",
        params![self.namespace],
      )
      .map_err(|e| eyre!("Failed to clear cache: {}", e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_write_then_read() {
    let storage = SqliteStorage::open_in_memory("test").unwrap();
    storage.write("a", "{\"x\":1}").unwrap();

    assert_eq!(storage.read("a").unwrap().as_deref(), Some("{\"x\":1}"));
    assert_eq!(storage.read("missing").unwrap(), None);
  }

  #[test]
  fn test_write_replaces_existing() {
    let storage = SqliteStorage::open_in_memory("test").unwrap();
    storage.write("a", "old").unwrap();
    storage.write("a", "new").unwrap();

    assert_eq!(storage.read("a").unwrap().as_deref(), Some("new"));
  }

  #[test]
  fn test_remove() {
    let storage = SqliteStorage::open_in_memory("test").unwrap();
    storage.write("a", "1").unwrap();
    storage.remove("a").unwrap();

    assert_eq!(storage.read("a").unwrap(), None);
  }

  #[test]
  fn test_quota_rejects_oversized_write() {
    let storage = SqliteStorage::open_in_memory("test")
      .unwrap()
      .with_quota(16);

    storage.write("small", "0123456789").unwrap();
    assert!(storage.write("big", "0123456789").is_err());
    assert_eq!(storage.read("big").unwrap(), None);

    // Replacing an entry only counts its new size
    storage.write("small", "0123456789abcdef").unwrap();
  }

  #[test]
  fn test_clear_leaves_other_namespaces() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");

    let ours = SqliteStorage::open(Some(&path), "cinesearch").unwrap();
    let theirs = SqliteStorage::open(Some(&path), "other-app").unwrap();

    ours.write("k", "mine").unwrap();
    theirs.write("k", "theirs").unwrap();

    ours.clear().unwrap();

    assert_eq!(ours.read("k").unwrap(), None);
    assert_eq!(theirs.read("k").unwrap().as_deref(), Some("theirs"));
  }

  #[test]
  fn test_noop_storage_always_misses() {
    let storage = NoopStorage;
    storage.write("a", "1").unwrap();
    assert_eq!(storage.read("a").unwrap(), None);
  }
}
