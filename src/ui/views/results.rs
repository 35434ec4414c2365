use crate::app::Featured;
use crate::movies::{MovieError, SearchResult};
use crate::ui::renderfns::{kind_color, truncate};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// One row of a movie list
struct Row<'a> {
  title: &'a str,
  year: &'a str,
  kind: &'a str,
}

pub fn draw_search_results(
  frame: &mut Frame,
  area: Rect,
  result: &SearchResult,
  page: u32,
  total_pages: Option<u32>,
  selected: usize,
) {
  let title = match total_pages {
    Some(pages) => format!(
      " Results ({} found, page {}/{}) ",
      result.total_count, page, pages
    ),
    None => format!(" Results ({} found) ", result.total_count),
  };

  let rows: Vec<Row> = result
    .items
    .iter()
    .map(|m| Row {
      title: &m.title,
      year: &m.year,
      kind: &m.kind,
    })
    .collect();

  draw_list(frame, area, title, &rows, selected);
}

pub fn draw_featured(frame: &mut Frame, area: Rect, featured: &Featured, selected: usize) {
  match featured {
    Featured::Loading => draw_message(
      frame,
      area,
      " Featured ",
      "Loading featured movies...",
      Color::DarkGray,
    ),
    Featured::Failed(error) => draw_error(frame, area, " Featured ", error),
    Featured::Loaded(movies) if movies.is_empty() => draw_message(
      frame,
      area,
      " Featured ",
      "Press / to search for a movie.",
      Color::DarkGray,
    ),
    Featured::Loaded(movies) => {
      let rows: Vec<Row> = movies
        .iter()
        .map(|m| Row {
          title: &m.title,
          year: &m.year,
          kind: "movie",
        })
        .collect();
      draw_list(frame, area, " Featured ".to_string(), &rows, selected);
    }
  }
}

/// Bordered panel holding a single message
pub fn draw_message(frame: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
  let block = Block::default()
    .title(title.to_string())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let paragraph = Paragraph::new(message.to_string())
    .block(block)
    .wrap(Wrap { trim: true })
    .style(Style::default().fg(color));
  frame.render_widget(paragraph, area);
}

/// Cancellations are never shown, so callers only pass real failures here.
pub fn draw_error(frame: &mut Frame, area: Rect, title: &str, error: &MovieError) {
  let message = error
    .user_message()
    .unwrap_or_else(|| "Request cancelled.".to_string());
  draw_message(frame, area, title, &message, Color::Red);
}

fn draw_list(frame: &mut Frame, area: Rect, title: String, rows: &[Row], selected: usize) {
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let items: Vec<ListItem> = rows
    .iter()
    .map(|row| {
      let line = Line::from(vec![
        Span::styled(
          format!("{:<11}", truncate(row.year, 11)),
          Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(
          format!("{:<8}", truncate(row.kind, 8)),
          Style::default().fg(kind_color(row.kind)),
        ),
        Span::raw(" "),
        Span::raw(truncate(row.title, 70)),
      ]);
      ListItem::new(line)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_style(
      Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

  let mut state = ListState::default();
  state.select(Some(selected));

  frame.render_stateful_widget(list, area, &mut state);
}
