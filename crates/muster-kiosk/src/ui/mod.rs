//! TUI rendering — orchestrates all panes.

pub mod recent;
pub mod student;

use chrono::Utc;
use ratatui::{
  Frame,
  layout::{Constraint, Direction, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph},
};

use crate::app::App;

// ─── Root draw ────────────────────────────────────────────────────────────────

/// Main draw function called each frame.
pub fn draw(f: &mut Frame, app: &App) {
  let area = f.area();

  // Vertical stack: header, body, input line, status bar.
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // header
      Constraint::Min(0),    // body
      Constraint::Length(3), // input
      Constraint::Length(1), // status bar
    ])
    .split(area);

  draw_header(f, rows[0], app);
  draw_body(f, rows[1], app);
  draw_input(f, rows[2], app);
  draw_status(f, rows[3], app);
}

// ─── Header ───────────────────────────────────────────────────────────────────

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
  let now = app.local_time(Utc::now()).format("%A, %B %-d %Y  %H:%M:%S").to_string();

  let left = Span::styled(
    format!(" muster  [{}]", app.station.label()),
    Style::default()
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );
  let right = Span::styled(format!("{now} "), Style::default().fg(Color::Gray));

  // Simple left-right header: pad the middle.
  let left_width = left.content.chars().count() as u16;
  let right_width = right.content.chars().count() as u16;
  let pad = area
    .width
    .saturating_sub(left_width)
    .saturating_sub(right_width);

  let line = Line::from(vec![
    left,
    Span::raw(" ".repeat(pad as usize)),
    right,
  ]);

  let block = Block::default().style(Style::default().bg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Body ─────────────────────────────────────────────────────────────────────

fn draw_body(f: &mut Frame, area: Rect, app: &App) {
  // Student panel (65%) and recent-activity sidebar (35%).
  let cols = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
    .split(area);

  student::draw(f, cols[0], app);
  recent::draw(f, cols[1], app);
}

// ─── Input ────────────────────────────────────────────────────────────────────

fn draw_input(f: &mut Frame, area: Rect, app: &App) {
  let block = Block::default()
    .title(" Scan ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let line = if app.input.is_empty() {
    Line::from(Span::styled(
      "Scan a badge…",
      Style::default().fg(Color::DarkGray),
    ))
  } else {
    Line::from(app.input.as_str())
  };
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Status bar ───────────────────────────────────────────────────────────────

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
  let hints = "Enter submit  Esc clear  Tab station  Ctrl-C quit";

  let (label, colour) = if app.status_msg.starts_with("Error") {
    ("ERROR", Color::Red)
  } else if app.last_scan_recorded() {
    ("OK", Color::Green)
  } else {
    ("READY", Color::Cyan)
  };

  let status = if app.status_msg.is_empty() {
    hints.to_string()
  } else {
    app.status_msg.clone()
  };

  let mode_span = Span::styled(
    format!(" {label} "),
    Style::default()
      .fg(Color::Black)
      .bg(colour)
      .add_modifier(Modifier::BOLD),
  );
  let hint_span = Span::styled(
    format!("  {status}"),
    Style::default().fg(Color::Gray),
  );

  let line = Line::from(vec![mode_span, hint_span]);
  f.render_widget(
    Paragraph::new(line).style(Style::default().bg(Color::Black)),
    area,
  );
}
