//! Cooperative cancellation signal shared between a caller and its request.

use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable cancellation token.
///
/// Every clone observes the same signal. Cancelling is idempotent and
/// cannot be undone; start a new token for a new request.
#[derive(Debug, Clone)]
pub struct CancelToken {
  tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(false);
    Self { tx: Arc::new(tx) }
  }

  /// Signal cancellation to every holder of this token.
  pub fn cancel(&self) {
    self.tx.send_replace(true);
  }

  pub fn is_cancelled(&self) -> bool {
    *self.tx.borrow()
  }

  /// Resolve once the token has been cancelled.
  pub async fn cancelled(&self) {
    let mut rx = self.tx.subscribe();
    // The sender lives as long as `self`, so this only returns on cancel
    let _ = rx.wait_for(|cancelled| *cancelled).await;
  }
}

impl Default for CancelToken {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[test]
  fn test_new_token_is_not_cancelled() {
    assert!(!CancelToken::new().is_cancelled());
  }

  #[test]
  fn test_cancel_is_seen_by_clones() {
    let token = CancelToken::new();
    let clone = token.clone();

    clone.cancel();

    assert!(token.is_cancelled());
    assert!(clone.is_cancelled());
  }

  #[tokio::test]
  async fn test_cancelled_resolves_after_cancel() {
    let token = CancelToken::new();
    let waiter = token.clone();

    let handle = tokio::spawn(async move { waiter.cancelled().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(!handle.is_finished());

    token.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
      .await
      .expect("cancelled() should resolve")
      .unwrap();
  }

  #[tokio::test]
  async fn test_cancelled_resolves_immediately_when_already_cancelled() {
    let token = CancelToken::new();
    token.cancel();

    tokio::time::timeout(Duration::from_millis(100), token.cancelled())
      .await
      .expect("already-cancelled token should resolve at once");
  }
}
