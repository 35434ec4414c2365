use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::DEFAULT_TTL_HOURS;
use crate::debounce::DEFAULT_DEBOUNCE;
use crate::movies::cached_client::DEFAULT_TIMEOUT;
use crate::search::DEFAULT_PAGE_SIZE;

/// Default endpoint of the movie database.
pub const DEFAULT_API_URL: &str = "https://www.omdbapi.com/";

/// Default persistent cache budget (5 MiB).
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub search: SearchConfig,
  /// Movie ids shown before the first search
  #[serde(default = "default_featured")]
  pub featured: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub url: String,
  /// Prefer the CINESEARCH_API_KEY environment variable over this field
  pub api_key: Option<String>,
  pub timeout_secs: u64,
  /// Restrict searches to "movie", "series" or "episode"
  pub result_type: Option<String>,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: DEFAULT_API_URL.to_string(),
      api_key: None,
      timeout_secs: DEFAULT_TIMEOUT.as_secs(),
      result_type: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub enabled: bool,
  pub ttl_hours: i64,
  pub quota_bytes: u64,
  /// Database location (defaults to the user data directory)
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      ttl_hours: DEFAULT_TTL_HOURS,
      quota_bytes: DEFAULT_QUOTA_BYTES,
      path: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
  pub debounce_ms: u64,
  pub page_size: u32,
}

impl Default for SearchConfig {
  fn default() -> Self {
    Self {
      debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
      page_size: DEFAULT_PAGE_SIZE,
    }
  }
}

impl SearchConfig {
  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

impl ApiConfig {
  pub fn timeout(&self) -> Duration {
    Duration::from_secs(self.timeout_secs.max(1))
  }
}

fn default_featured() -> Vec<String> {
  ["tt0111161", "tt0068646", "tt0468569", "tt0133093", "tt0114369"]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./cinesearch.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/cinesearch/config.yaml
  ///
  /// Without a file, defaults apply.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self {
        featured: default_featured(),
        ..Self::default()
      }),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("cinesearch.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("cinesearch").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file deserializes to null rather than an empty mapping
    if contents.trim().is_empty() {
      return Ok(Self {
        featured: default_featured(),
        ..Self::default()
      });
    }
    serde_yaml::from_str(contents)
  }

  /// Get the movie API key.
  ///
  /// Checks CINESEARCH_API_KEY first, then OMDB_API_KEY, then the config file.
  /// Validation happens per request, so a bad key fails every lookup rather
  /// than startup.
  pub fn api_key(&self) -> Option<String> {
    std::env::var("CINESEARCH_API_KEY")
      .or_else(|_| std::env::var("OMDB_API_KEY"))
      .ok()
      .or_else(|| self.api.api_key.clone())
  }
}
