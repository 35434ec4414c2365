use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A search request: what to look for and which page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
  pub term: String,
  pub page: u32,
}

/// One page of search results plus the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
  pub items: Vec<MovieSummary>,
  pub total_count: u64,
}

/// Summary of a movie for list views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
  #[serde(rename = "imdbID")]
  pub id: String,
  #[serde(rename = "Title", default)]
  pub title: String,
  #[serde(rename = "Year", default)]
  pub year: String,
  #[serde(rename = "Type", default)]
  pub kind: String,
  #[serde(rename = "Poster", default)]
  pub poster: String,
}

/// Full movie details.
///
/// Fields not named here are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
  #[serde(rename = "imdbID")]
  pub id: String,
  #[serde(rename = "Title", default)]
  pub title: String,
  #[serde(rename = "Year", default)]
  pub year: String,
  #[serde(rename = "Rated", default)]
  pub rated: String,
  #[serde(rename = "Runtime", default)]
  pub runtime: String,
  #[serde(rename = "Genre", default)]
  pub genre: String,
  #[serde(rename = "Director", default)]
  pub director: String,
  #[serde(rename = "Actors", default)]
  pub actors: String,
  #[serde(rename = "Plot", default)]
  pub plot: String,
  #[serde(rename = "Poster", default)]
  pub poster: String,
  #[serde(rename = "imdbRating", default)]
  pub rating: String,
  #[serde(flatten)]
  pub extra: BTreeMap<String, serde_json::Value>,
}
