mod renderfns;
mod views;

use crate::app::{App, Mode};
use crate::search::SearchPhase;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Length(3), // Search box
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let session = app.session();
  renderfns::draw_header(
    frame,
    chunks[0],
    session.term(),
    session.page(),
    session.total_pages(),
  );

  draw_search_box(frame, chunks[1], app);

  if let Some(detail) = app.detail() {
    views::detail::draw_detail(frame, chunks[2], detail);
  } else {
    match session.phase() {
      SearchPhase::Idle => {
        views::results::draw_featured(frame, chunks[2], app.featured(), app.selected());
      }
      SearchPhase::Searching => views::results::draw_message(
        frame,
        chunks[2],
        " Results ",
        &format!("Searching for \"{}\"...", session.term()),
        Color::DarkGray,
      ),
      SearchPhase::Populated(result) => views::results::draw_search_results(
        frame,
        chunks[2],
        result,
        session.page(),
        session.total_pages(),
        app.selected(),
      ),
      SearchPhase::Empty => views::results::draw_message(
        frame,
        chunks[2],
        " Results ",
        &format!("No movies match \"{}\".", session.term()),
        Color::DarkGray,
      ),
      SearchPhase::Failed(error) => {
        views::results::draw_error(frame, chunks[2], " Results ", error);
      }
    }
  }

  renderfns::draw_footer(frame, chunks[3], app.mode(), app.status());
}

fn draw_search_box(frame: &mut Frame, area: Rect, app: &App) {
  let editing = app.mode() == Mode::Search;
  let border = if editing { Color::Cyan } else { Color::DarkGray };
  let title = if app.is_debouncing() {
    " Search (typing...) "
  } else if app.session().is_searching() {
    " Search (loading...) "
  } else {
    " Search "
  };

  let mut text = app.input().to_string();
  if editing {
    text.push('_');
  }

  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  frame.render_widget(Paragraph::new(text).block(block), area);
}
