use crate::app::DetailView;
use crate::ui::renderfns::or_unknown;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

pub fn draw_detail(frame: &mut Frame, area: Rect, view: &DetailView) {
  let title = if view.is_loading() {
    format!(" {} (loading...) ", view.title)
  } else {
    format!(" {} ", view.title)
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let inner = block.inner(area);
  frame.render_widget(block, area);

  if let Some(error) = &view.error {
    let message = error
      .user_message()
      .unwrap_or_else(|| "Request cancelled.".to_string());
    let paragraph = Paragraph::new(format!("{}\n\nPress q to go back.", message))
      .wrap(Wrap { trim: true })
      .style(Style::default().fg(Color::Red));
    frame.render_widget(paragraph, inner);
    return;
  }

  let movie = match &view.movie {
    Some(movie) => movie,
    None => {
      let paragraph =
        Paragraph::new("Loading movie details...").style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }
  };

  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(5), // Facts
      Constraint::Length(1), // Separator
      Constraint::Min(1),    // Plot
    ])
    .split(inner);

  let label = Style::default().fg(Color::DarkGray);
  let facts = vec![
    Line::from(vec![
      Span::styled(&movie.title, Style::default().bold()),
      Span::raw(format!(" ({})", or_unknown(&movie.year))),
      Span::raw("  "),
      Span::styled(&movie.id, Style::default().fg(Color::Cyan)),
    ]),
    Line::from(vec![
      Span::styled("Rated: ", label),
      Span::raw(or_unknown(&movie.rated)),
      Span::raw("  "),
      Span::styled("Runtime: ", label),
      Span::raw(or_unknown(&movie.runtime)),
      Span::raw("  "),
      Span::styled("Rating: ", label),
      Span::styled(or_unknown(&movie.rating), Style::default().fg(Color::Yellow)),
    ]),
    Line::from(vec![
      Span::styled("Genre: ", label),
      Span::raw(or_unknown(&movie.genre)),
    ]),
    Line::from(vec![
      Span::styled("Director: ", label),
      Span::raw(or_unknown(&movie.director)),
    ]),
    Line::from(vec![
      Span::styled("Cast: ", label),
      Span::raw(or_unknown(&movie.actors)),
    ]),
  ];
  frame.render_widget(Paragraph::new(facts), chunks[0]);

  let sep = Paragraph::new("─".repeat(chunks[1].width as usize)).style(label);
  frame.render_widget(sep, chunks[1]);

  let plot = Paragraph::new(or_unknown(&movie.plot))
    .wrap(Wrap { trim: true })
    .style(Style::default());
  frame.render_widget(plot, chunks[2]);
}
