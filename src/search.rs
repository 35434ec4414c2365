//! Search and pagination state.
//!
//! A `SearchSession` owns the current term, page and total result count, and
//! the single request that is allowed to update them. Requests run on spawned
//! tasks and report back over a channel; the event loop calls `poll()` on
//! each tick to apply finished results.
//!
//! ```ignore
//! let client = client.clone();
//! let mut session = SearchSession::new(10, move |query, cancel| {
//!     let client = client.clone();
//!     async move { client.search(&query.term, query.page, &cancel).await }
//! });
//!
//! session.start_new_search("batman")?;
//!
//! // In event loop tick
//! if session.poll() {
//!     // State changed, trigger re-render
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::movies::{MovieError, SearchQuery, SearchResult};

/// Results per page returned by the movie service.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Where the session is in its request lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPhase {
  /// Nothing searched yet, or the search was cleared
  Idle,
  /// A request for the current term/page is in flight
  Searching,
  /// The last request returned at least one movie
  Populated(SearchResult),
  /// The last request succeeded with zero movies
  Empty,
  /// The last request failed
  Failed(MovieError),
}

/// A boxed future that resolves to one page of results
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, MovieError>> + Send>>;

/// A factory function that creates futures for fetching a page
type FetcherFn = Box<dyn Fn(SearchQuery, CancelToken) -> BoxFuture<SearchResult> + Send + Sync>;

/// A finished request, tagged with the generation that issued it
struct Completion {
  generation: u64,
  outcome: Result<SearchResult, MovieError>,
}

/// Search state with supersession: only the most recently issued request may
/// change it.
pub struct SearchSession {
  term: String,
  page: u32,
  total_count: Option<u64>,
  page_size: u32,
  phase: SearchPhase,
  fetcher: FetcherFn,
  /// Bumped on every issued request; stale completions carry an older value
  generation: u64,
  in_flight: Option<CancelToken>,
  tx: mpsc::UnboundedSender<Completion>,
  rx: mpsc::UnboundedReceiver<Completion>,
}

impl SearchSession {
  /// Create a session that fetches pages with `fetcher`.
  ///
  /// The fetcher receives the token for its request and should stop early
  /// when it is cancelled; results of cancelled requests are ignored either way.
  pub fn new<F, Fut>(page_size: u32, fetcher: F) -> Self
  where
    F: Fn(SearchQuery, CancelToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<SearchResult, MovieError>> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();

    Self {
      term: String::new(),
      page: 1,
      total_count: None,
      page_size: page_size.max(1),
      phase: SearchPhase::Idle,
      fetcher: Box::new(move |query, cancel| Box::pin(fetcher(query, cancel))),
      generation: 0,
      in_flight: None,
      tx,
      rx,
    }
  }

  pub fn term(&self) -> &str {
    &self.term
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  /// Total matches reported by the last successful request, if any.
  pub fn total_count(&self) -> Option<u64> {
    self.total_count
  }

  pub fn phase(&self) -> &SearchPhase {
    &self.phase
  }

  pub fn is_searching(&self) -> bool {
    matches!(self.phase, SearchPhase::Searching)
  }

  pub fn results(&self) -> Option<&SearchResult> {
    match &self.phase {
      SearchPhase::Populated(result) => Some(result),
      _ => None,
    }
  }

  /// Number of pages for the known total, if any.
  pub fn total_pages(&self) -> Option<u32> {
    self.total_count.map(|total| {
      let pages = total.div_ceil(self.page_size as u64).max(1);
      u32::try_from(pages).unwrap_or(u32::MAX)
    })
  }

  /// Start searching for `term` from page 1, superseding any pending request.
  ///
  /// A blank term clears the session and is rejected without a request.
  pub fn start_new_search(&mut self, term: &str) -> Result<(), MovieError> {
    self.supersede();
    self.page = 1;
    self.total_count = None;

    let term = term.trim();
    if term.is_empty() {
      self.term.clear();
      self.phase = SearchPhase::Idle;
      return Err(MovieError::Validation("search term is empty".to_string()));
    }

    self.term = term.to_string();
    self.issue();
    Ok(())
  }

  /// Fetch page `page` of the current term.
  ///
  /// Rejected without a request when there is no term, the page is below 1,
  /// or the page starts past the known total.
  pub fn go_to_page(&mut self, page: u32) -> Result<(), MovieError> {
    if self.term.is_empty() {
      return Err(MovieError::Validation("no active search".to_string()));
    }
    if page == 0 {
      return Err(MovieError::Validation("page must be at least 1".to_string()));
    }
    if let Some(total) = self.total_count {
      if (page as u64 - 1) * self.page_size as u64 >= total {
        return Err(MovieError::Validation(format!(
          "page {} is out of range",
          page
        )));
      }
    }

    self.supersede();
    self.page = page;
    self.issue();
    Ok(())
  }

  pub fn next_page(&mut self) -> Result<(), MovieError> {
    self.go_to_page(self.page.saturating_add(1))
  }

  pub fn prev_page(&mut self) -> Result<(), MovieError> {
    self.go_to_page(self.page.saturating_sub(1))
  }

  /// Abandon the pending request, if any.
  pub fn cancel(&mut self) {
    if self.in_flight.is_some() {
      self.supersede();
      self.phase = SearchPhase::Idle;
    }
  }

  /// Apply finished requests.
  ///
  /// Returns `true` if the state changed. Call this in your event loop tick
  /// handler.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    while let Ok(completion) = self.rx.try_recv() {
      if completion.generation != self.generation || self.in_flight.is_none() {
        debug!(generation = completion.generation, "discarding superseded search result");
        continue;
      }
      if matches!(completion.outcome, Err(MovieError::Cancelled)) {
        continue;
      }

      self.in_flight = None;
      self.phase = match completion.outcome {
        Ok(result) => {
          self.total_count = Some(result.total_count);
          if result.items.is_empty() {
            SearchPhase::Empty
          } else {
            SearchPhase::Populated(result)
          }
        }
        Err(e) => SearchPhase::Failed(e),
      };
      changed = true;
    }

    changed
  }

  /// Cancel the in-flight request and invalidate its generation.
  fn supersede(&mut self) {
    self.generation += 1;
    if let Some(token) = self.in_flight.take() {
      token.cancel();
    }
  }

  /// Internal: start the fetch for the current term and page
  fn issue(&mut self) {
    self.generation += 1;
    let generation = self.generation;
    let cancel = CancelToken::new();
    self.in_flight = Some(cancel.clone());
    self.phase = SearchPhase::Searching;

    debug!(term = %self.term, page = self.page, generation, "issuing search");

    let query = SearchQuery {
      term: self.term.clone(),
      page: self.page,
    };
    let future = (self.fetcher)(query, cancel);
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let outcome = future.await;
      // The session owns the receiver, so this only fails during shutdown
      let _ = tx.send(Completion {
        generation,
        outcome,
      });
    });
  }
}

impl std::fmt::Debug for SearchSession {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SearchSession")
      .field("term", &self.term)
      .field("page", &self.page)
      .field("total_count", &self.total_count)
      .field("phase", &self.phase)
      .field("generation", &self.generation)
      .finish_non_exhaustive()
  }
}
