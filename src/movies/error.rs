//! Failure taxonomy for movie lookups.

/// Errors surfaced by the movie client.
///
/// The kind is decided where the failure happens; callers match on the
/// variant, never on the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MovieError {
  /// Missing or malformed API credential.
  #[error("configuration error: {0}")]
  Configuration(String),

  /// Empty search term, empty identifier or page below 1.
  #[error("invalid input: {0}")]
  Validation(String),

  /// The request was aborted by the caller or superseded by a newer one.
  #[error("request cancelled")]
  Cancelled,

  /// Network failure, timeout or non-2xx HTTP status.
  #[error("network error: {0}")]
  Transport(String),

  /// The service reported a failure or returned an unusable payload.
  #[error("{0}")]
  Data(String),
}

impl MovieError {
  pub fn is_cancelled(&self) -> bool {
    matches!(self, MovieError::Cancelled)
  }

  /// Message to show the user, or `None` for outcomes that must stay silent.
  pub fn user_message(&self) -> Option<String> {
    match self {
      MovieError::Cancelled => None,
      other => Some(format!("{} (press r to try again)", other)),
    }
  }
}

impl From<reqwest::Error> for MovieError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      MovieError::Transport("request timed out".to_string())
    } else if let Some(status) = err.status() {
      MovieError::Transport(format!("HTTP {}", status))
    } else {
      MovieError::Transport(err.to_string())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cancelled_is_silent() {
    assert!(MovieError::Cancelled.is_cancelled());
    assert_eq!(MovieError::Cancelled.user_message(), None);
  }

  #[test]
  fn test_other_errors_have_retry_hint() {
    let errors = [
      MovieError::Configuration("missing API key".into()),
      MovieError::Validation("empty search term".into()),
      MovieError::Transport("HTTP 503".into()),
      MovieError::Data("Movie not found!".into()),
    ];

    for err in errors {
      assert!(!err.is_cancelled());
      let message = err.user_message().unwrap();
      assert!(message.ends_with("(press r to try again)"), "{}", message);
    }
  }

  #[test]
  fn test_data_error_displays_remote_message_verbatim() {
    let err = MovieError::Data("Movie not found!".to_string());
    assert_eq!(err.to_string(), "Movie not found!");
  }
}
