//! Serde-deserializable types matching movie API responses, and the
//! validation that turns a raw body into domain types.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::MovieError;
use super::types::{MovieDetail, MovieSummary, SearchResult};

// ============================================================================
// Search endpoint response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiSearchResponse {
  #[serde(rename = "Search", default)]
  pub search: Vec<Value>,
  #[serde(rename = "totalResults", default, deserialize_with = "lenient_count")]
  pub total_results: Option<u64>,
}

/// `totalResults` arrives as a string ("42"), occasionally as a number.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::Number(n)) => n.as_u64(),
    Some(Value::String(s)) => s.trim().parse().ok(),
    _ => None,
  })
}

// ============================================================================
// Validation
// ============================================================================

/// Fail with the service's own message when it flags the response as failed.
pub fn check_response(body: &Value) -> Result<(), MovieError> {
  let obj = body
    .as_object()
    .ok_or_else(|| MovieError::Data("Unexpected response from the movie service".to_string()))?;

  let failed = match obj.get("Response") {
    Some(Value::String(s)) => s.eq_ignore_ascii_case("false"),
    Some(Value::Bool(ok)) => !ok,
    _ => false,
  };

  if failed {
    let message = obj
      .get("Error")
      .and_then(|v| v.as_str())
      .unwrap_or("The movie service reported an error");
    return Err(MovieError::Data(message.to_string()));
  }

  Ok(())
}

/// Validate a search body and extract the renderable results.
///
/// Items without an identifier are dropped.
pub fn parse_search(body: &Value) -> Result<SearchResult, MovieError> {
  check_response(body)?;

  if !body.get("Search").is_some_and(Value::is_array) {
    return Err(MovieError::Data("No results found".to_string()));
  }

  let response = ApiSearchResponse::deserialize(body)
    .map_err(|e| MovieError::Data(format!("Malformed search response: {}", e)))?;

  let items: Vec<MovieSummary> = response
    .search
    .into_iter()
    .filter_map(|item| serde_json::from_value::<MovieSummary>(item).ok())
    .filter(|movie| !movie.id.trim().is_empty())
    .collect();

  let total_count = response.total_results.unwrap_or(items.len() as u64);

  Ok(SearchResult { items, total_count })
}

/// Validate a detail body.
pub fn parse_detail(body: &Value) -> Result<MovieDetail, MovieError> {
  check_response(body)?;

  let has_id = body
    .get("imdbID")
    .and_then(|v| v.as_str())
    .is_some_and(|id| !id.trim().is_empty());
  if !has_id {
    return Err(MovieError::Data("Movie not found".to_string()));
  }

  MovieDetail::deserialize(body)
    .map_err(|e| MovieError::Data(format!("Malformed movie details: {}", e)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_search() {
    let body = json!({
      "Search": [
        {"Title": "Batman Begins", "Year": "2005", "imdbID": "tt0372784", "Type": "movie", "Poster": "N/A"},
        {"Title": "The Batman", "Year": "2022", "imdbID": "tt1877830", "Type": "movie"}
      ],
      "totalResults": "617",
      "Response": "True"
    });

    let result = parse_search(&body).unwrap();
    assert_eq!(result.total_count, 617);
    assert_eq!(result.items.len(), 2);
    assert_eq!(result.items[0].id, "tt0372784");
    assert_eq!(result.items[0].title, "Batman Begins");
    assert_eq!(result.items[1].poster, "");
  }

  #[test]
  fn test_parse_search_remote_failure_keeps_message() {
    let body = json!({"Response": "False", "Error": "Movie not found!"});

    assert_eq!(
      parse_search(&body),
      Err(MovieError::Data("Movie not found!".to_string()))
    );
  }

  #[test]
  fn test_parse_search_boolean_failure_flag() {
    let body = json!({"Response": false, "Error": "Too many results."});

    assert_eq!(
      parse_search(&body),
      Err(MovieError::Data("Too many results.".to_string()))
    );
  }

  #[test]
  fn test_parse_search_without_results_collection() {
    let body = json!({"Response": "True", "totalResults": "3"});

    assert_eq!(
      parse_search(&body),
      Err(MovieError::Data("No results found".to_string()))
    );
  }

  #[test]
  fn test_parse_search_drops_items_without_id() {
    let body = json!({
      "Search": [
        {"Title": "No id"},
        {"Title": "Blank id", "imdbID": " "},
        {"Title": "Heat", "imdbID": "tt0113277"}
      ],
      "totalResults": 3
    });

    let result = parse_search(&body).unwrap();
    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].title, "Heat");
    assert_eq!(result.total_count, 3);
  }

  #[test]
  fn test_parse_search_empty_collection_is_ok() {
    let body = json!({"Search": [], "totalResults": "0"});

    let result = parse_search(&body).unwrap();
    assert!(result.items.is_empty());
    assert_eq!(result.total_count, 0);
  }

  #[test]
  fn test_parse_search_missing_total_uses_item_count() {
    let body = json!({"Search": [{"imdbID": "tt1"}, {"imdbID": "tt2"}]});

    assert_eq!(parse_search(&body).unwrap().total_count, 2);
  }

  #[test]
  fn test_parse_search_rejects_non_object() {
    assert!(matches!(
      parse_search(&json!([1, 2, 3])),
      Err(MovieError::Data(_))
    ));
  }

  #[test]
  fn test_parse_detail_keeps_unknown_fields() {
    let body = json!({
      "Title": "Heat",
      "Year": "1995",
      "imdbID": "tt0113277",
      "Director": "Michael Mann",
      "BoxOffice": "$67,436,818",
      "Response": "True"
    });

    let detail = parse_detail(&body).unwrap();
    assert_eq!(detail.id, "tt0113277");
    assert_eq!(detail.director, "Michael Mann");
    assert_eq!(detail.extra.get("BoxOffice"), Some(&json!("$67,436,818")));
  }

  #[test]
  fn test_parse_detail_without_id() {
    let body = json!({"Title": "Mystery", "Response": "True"});

    assert_eq!(
      parse_detail(&body),
      Err(MovieError::Data("Movie not found".to_string()))
    );
  }

  #[test]
  fn test_parse_detail_remote_failure() {
    let body = json!({"Response": "False", "Error": "Incorrect IMDb ID."});

    assert_eq!(
      parse_detail(&body),
      Err(MovieError::Data("Incorrect IMDb ID.".to_string()))
    );
  }
}
