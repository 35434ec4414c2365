use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::MovieError;
use crate::config::ApiConfig;

/// Default user agent.
const USER_AGENT: &str = concat!("cinesearch/", env!("CARGO_PKG_VERSION"));

/// Transport seam for the movie database.
///
/// Implementors issue one GET request with the given query parameters and
/// return the decoded JSON body. Non-2xx statuses and network failures map
/// to `MovieError::Transport`.
pub trait MovieApi: Send + Sync + 'static {
  fn fetch(
    &self,
    params: Vec<(&'static str, String)>,
  ) -> impl Future<Output = Result<Value, MovieError>> + Send;
}

/// OMDb-compatible HTTP client
#[derive(Clone)]
pub struct OmdbClient {
  http: reqwest::Client,
  base_url: Url,
}

impl OmdbClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.url)
      .map_err(|e| eyre!("Invalid movie API URL {}: {}", config.url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(USER_AGENT)
      // Backstop only; the lifecycle timeout fires first
      .timeout(Duration::from_secs(config.timeout_secs.saturating_mul(2).max(1)))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }
}

impl MovieApi for OmdbClient {
  async fn fetch(&self, params: Vec<(&'static str, String)>) -> Result<Value, MovieError> {
    let url = Url::parse_with_params(self.base_url.as_str(), &params)
      .map_err(|e| MovieError::Transport(format!("invalid request URL: {}", e)))?;

    // Parameter names only; values carry the API key
    let names: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
    debug!(endpoint = %self.base_url, params = ?names, "GET");

    let response = self.http.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(MovieError::Transport(format!("HTTP {}", status)));
    }

    response
      .json::<Value>()
      .await
      .map_err(|e| MovieError::Transport(format!("invalid response body: {}", e)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_rejects_invalid_url() {
    let config = ApiConfig {
      url: "not a url".to_string(),
      ..ApiConfig::default()
    };
    assert!(OmdbClient::new(&config).is_err());
  }

  #[test]
  fn test_new_with_default_config() {
    let client = OmdbClient::new(&ApiConfig::default()).unwrap();
    assert_eq!(client.base_url.scheme(), "https");
  }
}
