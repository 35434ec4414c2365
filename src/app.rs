use crate::cache::{CacheLayer, CacheStorage, NoopStorage, SqliteStorage, DEFAULT_NAMESPACE};
use crate::cancel::CancelToken;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::event::{Event, EventHandler, MovieEvent};
use crate::movies::{CachedMovieClient, MovieDetail, MovieError, OmdbClient};
use crate::search::{SearchPhase, SearchSession};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Fine enough to honor the debounce delay without busy-looping.
const TICK_RATE: Duration = Duration::from_millis(50);

/// The client the application runs with.
pub type MovieClient = CachedMovieClient<OmdbClient, Box<dyn CacheStorage>>;

/// Build the cached movie client described by `config`.
///
/// When the persistent cache cannot be opened the client keeps working with
/// the in-memory tier only.
pub fn build_client(config: &Config) -> Result<MovieClient> {
  let storage: Box<dyn CacheStorage> = if config.cache.enabled {
    match SqliteStorage::open(config.cache.path.as_deref(), DEFAULT_NAMESPACE) {
      Ok(storage) => Box::new(storage.with_quota(config.cache.quota_bytes)),
      Err(e) => {
        warn!(error = %e, "persistent cache unavailable, using memory only");
        Box::new(NoopStorage)
      }
    }
  } else {
    Box::new(NoopStorage)
  };

  let ttl = chrono::Duration::try_hours(config.cache.ttl_hours)
    .unwrap_or_else(|| chrono::Duration::hours(crate::cache::DEFAULT_TTL_HOURS));
  let cache = CacheLayer::new(storage).with_ttl(ttl);
  let inner = OmdbClient::new(&config.api)?;

  Ok(
    CachedMovieClient::new(inner, cache, config.api_key())
      .with_timeout(config.api.timeout())
      .with_result_type(config.api.result_type.clone()),
  )
}

/// Delete every persisted response in this application's namespace.
///
/// Opens the on-disk store directly, regardless of `cache.enabled`, so a
/// store that cannot be opened is reported instead of silently skipped.
pub fn clear_persistent_cache(config: &Config) -> Result<()> {
  let storage = SqliteStorage::open(config.cache.path.as_deref(), DEFAULT_NAMESPACE)?;
  storage.clear()?;
  info!("persistent cache cleared");
  Ok(())
}

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Search,
}

/// The curated list shown before the first search
#[derive(Debug)]
pub enum Featured {
  Loading,
  Loaded(Vec<MovieDetail>),
  Failed(MovieError),
}

/// An open detail panel
#[derive(Debug)]
pub struct DetailView {
  pub id: String,
  pub title: String,
  pub movie: Option<MovieDetail>,
  pub error: Option<MovieError>,
}

impl DetailView {
  pub fn is_loading(&self) -> bool {
    self.movie.is_none() && self.error.is_none()
  }
}

/// Main application state
pub struct App {
  config: Config,

  client: MovieClient,

  /// Current term, page and the authoritative search request
  session: SearchSession,

  /// Typed terms waiting for a quiet period
  debouncer: Debouncer<String>,

  mode: Mode,

  /// Search box contents
  input: String,

  /// Highlighted row in the visible list
  selected: usize,

  featured: Featured,
  featured_cancel: CancelToken,

  detail: Option<DetailView>,
  detail_generation: u64,
  detail_cancel: Option<CancelToken>,

  /// One-line message for the status bar
  status: Option<String>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config, client: MovieClient) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    let search_client = client.clone();
    let session = SearchSession::new(config.search.page_size, move |query, cancel| {
      let client = search_client.clone();
      async move { client.search(&query.term, query.page, &cancel).await }
    });
    let debouncer = Debouncer::new(config.search.debounce());

    Self {
      config,
      client,
      session,
      debouncer,
      mode: Mode::Normal,
      input: String::new(),
      selected: 0,
      featured: Featured::Loading,
      featured_cancel: CancelToken::new(),
      detail: None,
      detail_generation: 0,
      detail_cancel: None,
      status: None,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self, initial_query: Option<String>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(TICK_RATE);
    self.event_tx = events.sender();

    self.load_featured();
    if let Some(query) = initial_query {
      self.input = query.trim().to_string();
      let term = self.input.clone();
      self.submit(&term);
    }

    let result = self.event_loop(&mut terminal, &mut events).await;

    self.session.cancel();
    self.featured_cancel.cancel();
    self.close_detail();

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }
    Ok(())
  }

  fn load_featured(&mut self) {
    if self.config.featured.is_empty() {
      self.featured = Featured::Loaded(Vec::new());
      return;
    }

    let client = self.client.clone();
    let ids = self.config.featured.clone();
    let cancel = self.featured_cancel.clone();
    let tx = self.event_tx.clone();
    self.featured = Featured::Loading;

    tokio::spawn(async move {
      let outcome = client.load_featured(&ids, &cancel).await;
      let _ = tx.send(Event::Movie(MovieEvent::FeaturedLoaded(outcome)));
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => {}
      Event::Movie(movie_event) => self.handle_movie_event(movie_event),
    }
    self.tick();
  }

  /// Release debounced input and apply finished searches.
  fn tick(&mut self) {
    if let Some(term) = self.debouncer.poll() {
      self.submit(&term);
    }
    if self.session.poll() {
      self.selected = 0;
    }
  }

  fn handle_movie_event(&mut self, event: MovieEvent) {
    match event {
      MovieEvent::FeaturedLoaded(outcome) => match outcome {
        Ok(movies) => {
          info!(count = movies.len(), "featured movies loaded");
          self.featured = Featured::Loaded(movies);
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => self.featured = Featured::Failed(e),
      },
      MovieEvent::DetailLoaded {
        generation,
        outcome,
      } => {
        if generation != self.detail_generation {
          return;
        }
        if matches!(outcome, Err(MovieError::Cancelled)) {
          return;
        }
        self.detail_cancel = None;
        if let Some(view) = self.detail.as_mut() {
          match outcome {
            Ok(movie) => view.movie = Some(movie),
            Err(e) => view.error = Some(e),
          }
        }
      }
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Search => self.handle_search_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('q') => {
        if self.detail.is_some() {
          self.close_detail();
        } else {
          self.should_quit = true;
        }
      }
      KeyCode::Esc => self.close_detail(),

      KeyCode::Char('/') | KeyCode::Char('s') => {
        self.close_detail();
        self.mode = Mode::Search;
      }

      KeyCode::Char('r') if self.detail.is_some() => self.retry_detail(),
      _ if self.detail.is_some() => {}

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Enter => self.open_selected(),

      // Pagination
      KeyCode::Right | KeyCode::Char('n') => {
        let outcome = self.session.next_page();
        self.report(outcome);
      }
      KeyCode::Left | KeyCode::Char('p') => {
        let outcome = self.session.prev_page();
        self.report(outcome);
      }

      KeyCode::Char('r') => self.retry(),
      KeyCode::Char('C') => self.clear_cache(),

      _ => {}
    }
  }

  fn handle_search_mode_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.debouncer.cancel();
        self.mode = Mode::Normal;
      }
      KeyCode::Enter => {
        self.mode = Mode::Normal;
        let term = self.debouncer.flush().unwrap_or_else(|| self.input.clone());
        self.submit(&term);
      }
      KeyCode::Backspace => {
        self.input.pop();
        self.debouncer.push(self.input.clone());
      }
      KeyCode::Char(c) => {
        self.input.push(c);
        self.debouncer.push(self.input.clone());
      }
      _ => {}
    }
  }

  /// Start a new search for `term`; a blank term returns to the featured list.
  fn submit(&mut self, term: &str) {
    self.selected = 0;
    self.close_detail();

    match self.session.start_new_search(term) {
      Ok(()) => self.status = None,
      Err(_) if term.trim().is_empty() => self.status = None,
      Err(e) => self.status = e.user_message(),
    }
  }

  /// Re-issue whatever failed last.
  fn retry(&mut self) {
    match self.session.phase() {
      SearchPhase::Failed(_) => {
        let outcome = self.session.go_to_page(self.session.page());
        self.report(outcome);
      }
      SearchPhase::Idle if matches!(self.featured, Featured::Failed(_)) => self.load_featured(),
      _ => {}
    }
  }

  /// Request a failed detail again.
  fn retry_detail(&mut self) {
    let failed = self
      .detail
      .as_ref()
      .filter(|view| view.error.is_some())
      .map(|view| (view.id.clone(), view.title.clone()));

    if let Some((id, title)) = failed {
      self.request_detail(id, title);
    }
  }

  fn clear_cache(&mut self) {
    self.status = Some(match self.client.clear_cache() {
      Ok(()) => "Cache cleared".to_string(),
      Err(e) => format!("Failed to clear cache: {}", e),
    });
  }

  fn report(&mut self, outcome: Result<(), MovieError>) {
    match outcome {
      Ok(()) => {
        self.selected = 0;
        self.status = None;
      }
      Err(e) => self.status = e.user_message(),
    }
  }

  fn visible_len(&self) -> usize {
    if let Some(result) = self.session.results() {
      return result.items.len();
    }
    match (self.session.phase(), &self.featured) {
      (SearchPhase::Idle, Featured::Loaded(movies)) => movies.len(),
      _ => 0,
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let len = self.visible_len();
    if len > 0 {
      self.selected = (self.selected as i32 + delta).rem_euclid(len as i32) as usize;
    }
  }

  fn open_selected(&mut self) {
    match (self.session.phase(), &self.featured) {
      (SearchPhase::Populated(result), _) => {
        if let Some(movie) = result.items.get(self.selected) {
          let (id, title) = (movie.id.clone(), movie.title.clone());
          self.request_detail(id, title);
        }
      }
      (SearchPhase::Idle, Featured::Loaded(movies)) => {
        // Featured entries already carry full details
        if let Some(movie) = movies.get(self.selected) {
          self.detail = Some(DetailView {
            id: movie.id.clone(),
            title: movie.title.clone(),
            movie: Some(movie.clone()),
            error: None,
          });
        }
      }
      _ => {}
    }
  }

  fn request_detail(&mut self, id: String, title: String) {
    self.close_detail();

    let generation = self.detail_generation;
    let cancel = CancelToken::new();
    self.detail_cancel = Some(cancel.clone());
    self.detail = Some(DetailView {
      id: id.clone(),
      title,
      movie: None,
      error: None,
    });

    let client = self.client.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      let outcome = client.get_detail(&id, &cancel).await;
      let _ = tx.send(Event::Movie(MovieEvent::DetailLoaded {
        generation,
        outcome,
      }));
    });
  }

  fn close_detail(&mut self) {
    if let Some(cancel) = self.detail_cancel.take() {
      cancel.cancel();
    }
    self.detail = None;
    self.detail_generation += 1;
  }

  // Accessors for UI rendering
  pub fn mode(&self) -> Mode {
    self.mode
  }

  pub fn input(&self) -> &str {
    &self.input
  }

  pub fn session(&self) -> &SearchSession {
    &self.session
  }

  pub fn featured(&self) -> &Featured {
    &self.featured
  }

  pub fn detail(&self) -> Option<&DetailView> {
    self.detail.as_ref()
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  pub fn is_debouncing(&self) -> bool {
    self.debouncer.is_pending()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ApiConfig;

  /// App whose client has no API key, so every request fails fast without
  /// touching the network.
  fn test_app(debounce_ms: u64) -> App {
    let mut config = Config::default();
    config.search.debounce_ms = debounce_ms;

    let storage: Box<dyn CacheStorage> = Box::new(NoopStorage);
    let client = CachedMovieClient::new(
      OmdbClient::new(&ApiConfig::default()).unwrap(),
      CacheLayer::new(storage),
      None,
    );
    App::new(config, client)
  }

  fn press(app: &mut App, code: KeyCode) {
    app.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)));
  }

  fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
      press(app, KeyCode::Char(c));
    }
  }

  async fn wait(app: &mut App, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    app.handle_event(Event::Tick);
  }

  #[tokio::test]
  async fn test_typing_is_debounced() {
    let mut app = test_app(40);

    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.mode(), Mode::Search);
    type_text(&mut app, "bat");

    assert_eq!(app.input(), "bat");
    assert!(app.is_debouncing());
    assert_eq!(app.session().phase(), &SearchPhase::Idle);

    wait(&mut app, 80).await;
    assert_eq!(app.session().term(), "bat");

    wait(&mut app, 30).await;
    assert!(matches!(
      app.session().phase(),
      SearchPhase::Failed(MovieError::Configuration(_))
    ));
  }

  #[tokio::test]
  async fn test_enter_searches_immediately() {
    let mut app = test_app(10_000);

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "heat");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.mode(), Mode::Normal);
    assert_eq!(app.session().term(), "heat");
    assert!(!app.is_debouncing());
  }

  #[tokio::test]
  async fn test_escape_drops_pending_search() {
    let mut app = test_app(20);

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "alien");
    press(&mut app, KeyCode::Esc);
    wait(&mut app, 50).await;

    assert_eq!(app.mode(), Mode::Normal);
    assert_eq!(app.session().phase(), &SearchPhase::Idle);
  }

  #[tokio::test]
  async fn test_paging_without_search_reports_status() {
    let mut app = test_app(10);

    press(&mut app, KeyCode::Char('n'));

    assert!(app.status().is_some());
    assert_eq!(app.session().phase(), &SearchPhase::Idle);
  }

  #[tokio::test]
  async fn test_quit_keys() {
    let mut app = test_app(10);
    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);

    let mut app = test_app(10);
    app.handle_event(Event::Key(KeyEvent::new(
      KeyCode::Char('c'),
      KeyModifiers::CONTROL,
    )));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn test_stale_detail_result_is_ignored() {
    let mut app = test_app(10);
    app.request_detail("tt1".to_string(), "First".to_string());
    let stale = app.detail_generation;
    app.request_detail("tt2".to_string(), "Second".to_string());

    app.handle_event(Event::Movie(MovieEvent::DetailLoaded {
      generation: stale,
      outcome: Err(MovieError::Data("Movie not found!".to_string())),
    }));

    let detail = app.detail().unwrap();
    assert_eq!(detail.id, "tt2");
    assert!(detail.error.is_none());
  }

  #[tokio::test]
  async fn test_retry_key_reloads_failed_detail() {
    let mut app = test_app(10);
    app.request_detail("tt0372784".to_string(), "Batman Begins".to_string());
    let first = app.detail_generation;

    app.handle_event(Event::Movie(MovieEvent::DetailLoaded {
      generation: first,
      outcome: Err(MovieError::Transport("HTTP 503".to_string())),
    }));
    assert!(app.detail().unwrap().error.is_some());

    press(&mut app, KeyCode::Char('r'));

    let detail = app.detail().unwrap();
    assert_eq!(detail.id, "tt0372784");
    assert!(detail.is_loading());
    assert!(app.detail_generation > first);
  }

  #[tokio::test]
  async fn test_retry_key_ignores_loaded_detail() {
    let mut app = test_app(10);
    app.request_detail("tt0372784".to_string(), "Batman Begins".to_string());
    let generation = app.detail_generation;

    press(&mut app, KeyCode::Char('r'));

    assert_eq!(app.detail_generation, generation);
  }

  #[test]
  fn test_clear_persistent_cache_removes_entries() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    let storage = SqliteStorage::open(Some(&path), DEFAULT_NAMESPACE).unwrap();
    storage.write("key", "value").unwrap();

    let mut config = Config::default();
    config.cache.path = Some(path);
    config.cache.enabled = false;
    clear_persistent_cache(&config).unwrap();

    assert_eq!(storage.read("key").unwrap(), None);
  }

  #[test]
  fn test_clear_persistent_cache_reports_unopenable_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();

    let mut config = Config::default();
    config.cache.path = Some(blocker.join("cache.db"));

    assert!(clear_persistent_cache(&config).is_err());
  }

  #[tokio::test]
  async fn test_featured_failure_is_kept_but_cancellation_is_not() {
    let mut app = test_app(10);

    app.handle_event(Event::Movie(MovieEvent::FeaturedLoaded(Err(
      MovieError::Cancelled,
    ))));
    assert!(matches!(app.featured(), Featured::Loading));

    app.handle_event(Event::Movie(MovieEvent::FeaturedLoaded(Err(
      MovieError::Transport("offline".to_string()),
    ))));
    assert!(matches!(app.featured(), Featured::Failed(_)));
  }
}
