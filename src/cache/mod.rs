//! Generic two-tier caching layer.
//!
//! This module provides an API-agnostic caching mechanism that:
//! - Keeps recently used payloads in an in-process map
//! - Persists payloads to namespaced key/value storage with a size quota
//! - Expires entries after a fixed time-to-live
//! - Treats persistent write failures as best-effort, never failing the caller

mod layer;
mod storage;
mod traits;

pub use layer::{CacheLayer, DEFAULT_TTL_HOURS};
pub use storage::{CacheStorage, NoopStorage, SqliteStorage, DEFAULT_NAMESPACE};
pub use traits::QueryKey;
