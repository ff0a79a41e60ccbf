//! Student panel — left pane showing the last scan.

use chrono::{DateTime, Utc};
use muster_core::{attendance::AttendanceEvent, scan::ScanKind, student::Student};
use ratatui::{
  Frame,
  layout::{Alignment, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::App;

/// Render the student panel into `area`.
pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Student ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));

  let inner = block.inner(area);
  f.render_widget(block, area);

  let Some(outcome) = &app.outcome else {
    let hint = Paragraph::new("Waiting for a scan.")
      .style(Style::default().fg(Color::DarkGray))
      .alignment(Alignment::Center);
    f.render_widget(hint, inner);
    return;
  };

  let mut lines = vec![Line::from(Span::styled(
    outcome.message.clone(),
    Style::default()
      .fg(kind_colour(outcome.kind))
      .add_modifier(Modifier::BOLD),
  ))];
  lines.push(Line::from(""));

  if let Some(student) = &outcome.student {
    lines.extend(student_lines(student));
  }
  if let Some(event) = &outcome.event {
    lines.push(Line::from(""));
    lines.extend(event_lines(app, event));
  }

  f.render_widget(
    Paragraph::new(lines)
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true }),
    inner,
  );
}

fn kind_colour(kind: ScanKind) -> Color {
  match kind {
    ScanKind::NotFound => Color::Red,
    ScanKind::TimeIn | ScanKind::NewTimeIn => Color::Green,
    ScanKind::TimeOut => Color::Yellow,
    ScanKind::OrphanTimeOut => Color::Magenta,
  }
}

fn student_lines(student: &Student) -> Vec<Line<'static>> {
  let profile = &student.profile;
  let mut lines = vec![
    Line::from(Span::styled(
      student.display_name(),
      Style::default().add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled(
      student.scan_code.clone(),
      Style::default().fg(Color::DarkGray),
    )),
  ];

  let details: Vec<String> = [
    profile.department.clone(),
    profile.year_level.map(|y| format!("Year {y}")),
  ]
  .into_iter()
  .flatten()
  .collect();
  if !details.is_empty() {
    lines.push(Line::from(details.join("  ·  ")));
  }
  lines
}

fn event_lines(app: &App, event: &AttendanceEvent) -> Vec<Line<'static>> {
  vec![
    time_line(app, "IN ", event.time_in, Color::Green),
    time_line(app, "OUT", event.time_out, Color::Yellow),
  ]
}

fn time_line(
  app: &App,
  label: &'static str,
  at: Option<DateTime<Utc>>,
  colour: Color,
) -> Line<'static> {
  let value = at
    .map(|t| app.local_time(t).format("%H:%M:%S").to_string())
    .unwrap_or_else(|| "—".into());
  Line::from(vec![
    Span::styled(
      format!("{label}  "),
      Style::default().fg(colour).add_modifier(Modifier::BOLD),
    ),
    Span::raw(value),
  ])
}
