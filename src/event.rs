use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::movies::{MovieDetail, MovieError};

/// Application events
#[derive(Debug)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for debounce deadlines and search polling
  Tick,
  /// A background movie request finished
  Movie(MovieEvent),
}

/// Results of background requests that are not searches
#[derive(Debug)]
pub enum MovieEvent {
  FeaturedLoaded(Result<Vec<MovieDetail>, MovieError>),
  DetailLoaded {
    /// Which detail request this answers; older ones are ignored
    generation: u64,
    outcome: Result<MovieDetail, MovieError>,
  },
}

/// Event handler that produces events from terminal input and a tick timer
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    let input_tx = tx.clone();

    // Spawn terminal event reader
    tokio::spawn(async move {
      loop {
        if event::poll(tick_rate).unwrap_or(false) {
          if let Ok(CrosstermEvent::Key(key)) = event::read() {
            if key.kind == KeyEventKind::Press && input_tx.send(Event::Key(key)).is_err() {
              break;
            }
          }
        } else if input_tx.send(Event::Tick).is_err() {
          break;
        }
      }
    });

    Self { tx, rx }
  }

  /// Sender for background tasks to report back on
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}
