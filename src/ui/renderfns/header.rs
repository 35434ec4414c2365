use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, current search, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  term: &str,
  page: u32,
  total_pages: Option<u32>,
) {
  let mut spans = vec![
    Span::styled(" cinesearch ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
  ];

  if term.is_empty() {
    spans.push(Span::styled(" featured ", Style::default().fg(Color::White)));
  } else {
    spans.push(Span::styled(
      format!(" \"{}\" ", term),
      Style::default().fg(Color::Yellow).bold(),
    ));
    spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
    spans.push(Span::styled(
      format!(" {} ", page_label(page, total_pages)),
      Style::default().fg(Color::White),
    ));
  }

  spans.extend([
    Span::raw("  "),
    // Shortcuts - keys and brackets highlighted, descriptions dimmed
    Span::styled("</>", Style::default().fg(Color::Cyan)),
    Span::styled(" search", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<n/p>", Style::default().fg(Color::Cyan)),
    Span::styled(" page", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<q>", Style::default().fg(Color::Cyan)),
    Span::styled(" back", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

/// "page X of Y", or just "page X" while the total is unknown
fn page_label(page: u32, total_pages: Option<u32>) -> String {
  match total_pages {
    Some(total) if total > 0 => format!("page {} of {}", page, total),
    _ => format!("page {}", page),
  }
}
