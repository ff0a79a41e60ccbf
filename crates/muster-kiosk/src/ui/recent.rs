//! Recent-activity sidebar — right pane.

use muster_core::attendance::ActivityEntry;
use ratatui::{
  Frame,
  layout::Rect,
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, List, ListItem},
};

use crate::app::App;

/// Render the recent-activity list into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Recent ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let items: Vec<ListItem> = app.recent.iter().map(|entry| item(app, entry)).collect();

  if items.is_empty() {
    let empty = List::new([ListItem::new(Span::styled(
      "No activity yet.",
      Style::default().fg(Color::DarkGray),
    ))])
    .block(block);
    f.render_widget(empty, area);
    return;
  }

  f.render_widget(List::new(items).block(block), area);
}

fn item(app: &App, entry: &ActivityEntry) -> ListItem<'static> {
  let event = &entry.event;
  // An entry's latest change is its time-out when it has one.
  let (label, colour, at) = match (event.time_in, event.time_out) {
    (_, Some(out)) => ("OUT", Color::Yellow, out),
    (Some(time_in), None) => ("IN ", Color::Green, time_in),
    (None, None) => ("   ", Color::DarkGray, event.updated_at),
  };

  ListItem::new(vec![
    Line::from(Span::styled(
      entry.student.display_name(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(vec![
      Span::styled(format!("{label} "), Style::default().fg(colour)),
      Span::styled(
        app.local_time(at).format("%H:%M").to_string(),
        Style::default().fg(Color::DarkGray),
      ),
    ]),
  ])
}
