use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Get the display color for a result type
pub fn kind_color(kind: &str) -> Color {
  match kind {
    "movie" => Color::Cyan,
    "series" => Color::Magenta,
    "episode" => Color::Yellow,
    _ => Color::White,
  }
}

/// Render an API field, which uses "N/A" for missing values
pub fn or_unknown(value: &str) -> &str {
  if value.is_empty() || value == "N/A" {
    "unknown"
  } else {
    value
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Amélie Poulain", 6), "Amé...");
  }

  #[test]
  fn test_kind_color() {
    assert_eq!(kind_color("movie"), Color::Cyan);
    assert_eq!(kind_color("series"), Color::Magenta);
    assert_eq!(kind_color("episode"), Color::Yellow);
    assert_eq!(kind_color("game"), Color::White);
  }

  #[test]
  fn test_or_unknown() {
    assert_eq!(or_unknown("N/A"), "unknown");
    assert_eq!(or_unknown(""), "unknown");
    assert_eq!(or_unknown("PG-13"), "PG-13");
  }
}
