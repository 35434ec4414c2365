//! Movie client with read-through caching, timeouts and cancellation.

use color_eyre::Result;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::{CacheLayer, CacheStorage};
use crate::cancel::CancelToken;

use super::api_types::{parse_detail, parse_search};
use super::cache::MovieQueryKey;
use super::client::MovieApi;
use super::error::MovieError;
use super::types::{MovieDetail, SearchResult};

/// Value shipped in sample configs; never a usable key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

/// Shortest key the service hands out.
pub const MIN_API_KEY_LEN: usize = 8;

/// How long a single request may take before it is aborted.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Check that an API key is present and plausibly well-formed.
pub fn validate_api_key(key: Option<&str>) -> Result<&str, MovieError> {
  let key = key.map(str::trim).unwrap_or_default();

  if key.is_empty() {
    return Err(MovieError::Configuration(
      "no API key configured; set CINESEARCH_API_KEY".to_string(),
    ));
  }
  if key == PLACEHOLDER_API_KEY {
    return Err(MovieError::Configuration(
      "API key is still the placeholder value".to_string(),
    ));
  }
  if key.len() < MIN_API_KEY_LEN {
    return Err(MovieError::Configuration(format!(
      "API key is too short (expected at least {} characters)",
      MIN_API_KEY_LEN
    )));
  }

  Ok(key)
}

/// Movie client with transparent caching support.
///
/// Validates input and credentials before touching the network, serves
/// fresh cache hits directly and writes validated responses back.
pub struct CachedMovieClient<A: MovieApi, S: CacheStorage> {
  inner: Arc<A>,
  cache: CacheLayer<S>,
  api_key: Option<String>,
  timeout: Duration,
  /// Optional `type` filter for searches (movie, series, episode)
  result_type: Option<String>,
}

impl<A: MovieApi, S: CacheStorage> CachedMovieClient<A, S> {
  pub fn new(inner: A, cache: CacheLayer<S>, api_key: Option<String>) -> Self {
    Self {
      inner: Arc::new(inner),
      cache,
      api_key,
      timeout: DEFAULT_TIMEOUT,
      result_type: None,
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_result_type(mut self, result_type: Option<String>) -> Self {
    self.result_type = result_type.filter(|t| !t.trim().is_empty());
    self
  }

  /// Search titles, one page at a time.
  pub async fn search(
    &self,
    term: &str,
    page: u32,
    cancel: &CancelToken,
  ) -> Result<SearchResult, MovieError> {
    let api_key = validate_api_key(self.api_key.as_deref())?;

    let term = term.trim();
    if term.is_empty() {
      return Err(MovieError::Validation("search term is empty".to_string()));
    }
    if page == 0 {
      return Err(MovieError::Validation("page must be at least 1".to_string()));
    }

    let key = MovieQueryKey::Search {
      term: term.to_string(),
      page,
      result_type: self.result_type.clone(),
    };

    if let Some(cached) = self.cache.get(&key) {
      match parse_search(&cached) {
        Ok(result) => return Ok(result),
        Err(e) => warn!(error = %e, "ignoring unusable cached search"),
      }
    }

    let mut params = vec![
      ("apikey", api_key.to_string()),
      ("s", term.to_string()),
      ("page", page.to_string()),
      ("r", "json".to_string()),
    ];
    if let Some(kind) = &self.result_type {
      params.push(("type", kind.clone()));
    }

    let body = self.call(params, cancel).await?;
    let result = parse_search(&body)?;
    info!(term, page, total = result.total_count, "search completed");

    self.cache.set(&key, body);
    Ok(result)
  }

  /// Get a single movie by identifier.
  pub async fn get_detail(&self, id: &str, cancel: &CancelToken) -> Result<MovieDetail, MovieError> {
    let api_key = validate_api_key(self.api_key.as_deref())?;

    let id = id.trim();
    if id.is_empty() {
      return Err(MovieError::Validation("movie id is empty".to_string()));
    }

    let key = MovieQueryKey::Detail { id: id.to_string() };

    if let Some(cached) = self.cache.get(&key) {
      match parse_detail(&cached) {
        Ok(detail) => return Ok(detail),
        Err(e) => warn!(error = %e, "ignoring unusable cached detail"),
      }
    }

    let params = vec![
      ("apikey", api_key.to_string()),
      ("i", id.to_string()),
      ("plot", "full".to_string()),
      ("r", "json".to_string()),
    ];

    let body = self.call(params, cancel).await?;
    let detail = parse_detail(&body)?;
    debug!(id, title = %detail.title, "detail loaded");

    self.cache.set(&key, body);
    Ok(detail)
  }

  /// Load a curated set of movies concurrently.
  ///
  /// Individual failures are logged and skipped; the batch only fails when
  /// nothing could be loaded.
  pub async fn load_featured(
    &self,
    ids: &[String],
    cancel: &CancelToken,
  ) -> Result<Vec<MovieDetail>, MovieError> {
    let outcomes = join_all(ids.iter().map(|id| self.get_detail(id, cancel))).await;

    if cancel.is_cancelled() {
      return Err(MovieError::Cancelled);
    }

    let mut movies = Vec::with_capacity(ids.len());
    let mut first_error = None;

    for (id, outcome) in ids.iter().zip(outcomes) {
      match outcome {
        Ok(movie) => movies.push(movie),
        Err(e) => {
          warn!(id = %id, error = %e, "featured movie failed to load");
          first_error.get_or_insert(e);
        }
      }
    }

    match first_error {
      Some(e) if movies.is_empty() => Err(e),
      _ => Ok(movies),
    }
  }

  /// Empty both cache tiers.
  pub fn clear_cache(&self) -> Result<()> {
    info!("clearing movie cache");
    self.cache.clear()
  }

  /// Issue one request, bounded by the timeout and the cancellation token.
  async fn call(
    &self,
    params: Vec<(&'static str, String)>,
    cancel: &CancelToken,
  ) -> Result<Value, MovieError> {
    if cancel.is_cancelled() {
      return Err(MovieError::Cancelled);
    }

    let request = tokio::time::timeout(self.timeout, self.inner.fetch(params));

    tokio::select! {
      biased;
      _ = cancel.cancelled() => {
        debug!("request cancelled");
        Err(MovieError::Cancelled)
      }
      outcome = request => match outcome {
        Ok(result) => result,
        Err(_) => Err(MovieError::Transport(format!(
          "request timed out after {}s",
          self.timeout.as_secs_f32()
        ))),
      },
    }
  }
}

impl<A: MovieApi, S: CacheStorage> Clone for CachedMovieClient<A, S> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
      cache: self.cache.clone(),
      api_key: self.api_key.clone(),
      timeout: self.timeout,
      result_type: self.result_type.clone(),
    }
  }
}
