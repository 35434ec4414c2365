//! Cache keys for movie API calls.

use crate::cache::QueryKey;

/// Query key types for movie API calls.
#[derive(Clone, Debug)]
pub enum MovieQueryKey {
  /// One page of a title search, optionally restricted to a result type
  Search {
    term: String,
    page: u32,
    result_type: Option<String>,
  },
  /// A single movie by identifier
  Detail { id: String },
}

impl QueryKey for MovieQueryKey {
  fn normalized(&self) -> String {
    match self {
      Self::Search {
        term,
        page,
        result_type,
      } => match result_type.as_deref().map(str::trim) {
        Some(kind) if !kind.is_empty() => format!(
          "search:{}:{}:{}",
          normalize_term(term),
          page,
          kind.to_lowercase()
        ),
        _ => format!("search:{}:{}", normalize_term(term), page),
      },
      Self::Detail { id } => format!("detail:{}", id.trim()),
    }
  }
}

/// Normalize a search term for consistent hashing.
/// Trims whitespace and lowercases for case-insensitive matching.
fn normalize_term(term: &str) -> String {
  term.trim().to_lowercase()
}
