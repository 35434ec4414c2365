use crate::app::Mode;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the status bar: a pending message wins over the key hints
pub fn draw_footer(frame: &mut Frame, area: Rect, mode: Mode, status: Option<&str>) {
  let (content, style) = match (status, mode) {
    (Some(message), _) => (format!(" {}", message), Style::default().fg(Color::Red)),
    (None, Mode::Normal) => (
      " /search  j/k:nav  Enter:details  n/p:page  r:retry  C:clear cache  q:back  Ctrl-C:quit"
        .to_string(),
      Style::default().fg(Color::DarkGray),
    ),
    (None, Mode::Search) => (
      " Enter:search now  Esc:cancel".to_string(),
      Style::default().fg(Color::DarkGray),
    ),
  };

  let paragraph = Paragraph::new(content).style(style.bg(Color::Black));
  frame.render_widget(paragraph, area);
}
