//! Keystroke coalescing for search-as-you-type.

use std::time::{Duration, Instant};

/// Quiet period before a typed term is searched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Holds the latest value until no new value has arrived for `delay`.
///
/// Tick-driven: call `poll()` from the event loop and act on what it returns.
#[derive(Debug)]
pub struct Debouncer<T> {
  delay: Duration,
  pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
  pub fn new(delay: Duration) -> Self {
    Self {
      delay,
      pending: None,
    }
  }

  /// Replace the pending value and restart the quiet period.
  pub fn push(&mut self, value: T) {
    self.push_at(value, Instant::now());
  }

  pub fn push_at(&mut self, value: T, now: Instant) {
    self.pending = Some((value, now + self.delay));
  }

  /// Take the pending value once its quiet period has elapsed.
  pub fn poll(&mut self) -> Option<T> {
    self.poll_at(Instant::now())
  }

  pub fn poll_at(&mut self, now: Instant) -> Option<T> {
    match &self.pending {
      Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(value, _)| value),
      _ => None,
    }
  }

  /// Take the pending value immediately, e.g. when the user presses Enter.
  pub fn flush(&mut self) -> Option<T> {
    self.pending.take().map(|(value, _)| value)
  }

  /// Drop the pending value.
  pub fn cancel(&mut self) {
    self.pending = None;
  }

  pub fn is_pending(&self) -> bool {
    self.pending.is_some()
  }
}

impl<T> Default for Debouncer<T> {
  fn default() -> Self {
    Self::new(DEFAULT_DEBOUNCE)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_value_released_after_quiet_period() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(Duration::from_millis(300));

    debouncer.push_at("bat", start);

    assert_eq!(debouncer.poll_at(start + Duration::from_millis(299)), None);
    assert_eq!(
      debouncer.poll_at(start + Duration::from_millis(300)),
      Some("bat")
    );
    assert!(!debouncer.is_pending());
  }

  #[test]
  fn test_rapid_keystrokes_coalesce_to_last() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(Duration::from_millis(300));

    debouncer.push_at("b", start);
    debouncer.push_at("ba", start + Duration::from_millis(100));
    debouncer.push_at("bat", start + Duration::from_millis(200));

    // 300ms after the first keystroke, but only 100ms after the last
    assert_eq!(debouncer.poll_at(start + Duration::from_millis(300)), None);
    assert_eq!(
      debouncer.poll_at(start + Duration::from_millis(500)),
      Some("bat")
    );
    assert_eq!(debouncer.poll_at(start + Duration::from_millis(900)), None);
  }

  #[test]
  fn test_flush_skips_the_wait() {
    let mut debouncer = Debouncer::default();
    debouncer.push("heat".to_string());

    assert_eq!(debouncer.flush(), Some("heat".to_string()));
    assert_eq!(debouncer.flush(), None);
  }

  #[test]
  fn test_cancel_drops_pending() {
    let start = Instant::now();
    let mut debouncer = Debouncer::new(Duration::from_millis(10));
    debouncer.push_at(1, start);

    debouncer.cancel();

    assert_eq!(debouncer.poll_at(start + Duration::from_secs(1)), None);
  }
}
