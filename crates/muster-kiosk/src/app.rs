//! Kiosk view state and keystroke handling.
//!
//! Badge scanners behave like keyboards: they type the code quickly and may
//! or may not finish with Enter. Input is submitted on Enter, or once the
//! keyboard has been idle for the debounce window.

use std::{
  sync::Arc,
  time::{Duration, Instant},
};

use chrono::{DateTime, FixedOffset, Utc};
use clap::ValueEnum;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use muster_core::{attendance::ActivityEntry, scan::{ScanAction, ScanKind, ScanOutcome}};
use serde::Deserialize;

use crate::client::ApiClient;

// ─── Station ──────────────────────────────────────────────────────────────────

/// Which direction this kiosk records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Station {
  In,
  Out,
  #[default]
  Auto,
}

impl Station {
  /// The explicit action sent with each scan; `None` lets the server decide.
  pub fn action(self) -> Option<ScanAction> {
    match self {
      Station::In => Some(ScanAction::TimeIn),
      Station::Out => Some(ScanAction::TimeOut),
      Station::Auto => None,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Station::In => "TIME IN",
      Station::Out => "TIME OUT",
      Station::Auto => "AUTO",
    }
  }

  fn next(self) -> Self {
    match self {
      Station::In => Station::Out,
      Station::Out => Station::Auto,
      Station::Auto => Station::In,
    }
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

/// What the event loop should do after a key press.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
  Continue,
  Submit(String),
  Quit,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level kiosk state.
pub struct App {
  pub station: Station,

  /// Idle time after the last keystroke before the input is submitted.
  pub debounce: Duration,

  /// School-local offset used for every time shown on screen.
  pub utc_offset: FixedOffset,

  /// Characters typed since the last submission.
  pub input: String,

  last_key: Option<Instant>,

  /// Result of the most recent scan, if it reached the server.
  pub outcome: Option<ScanOutcome>,

  /// Recent-activity feed, newest first.
  pub recent: Vec<ActivityEntry>,

  /// One-line status message shown in the status bar.
  pub status_msg: String,

  /// Shared HTTP client.
  pub client: Arc<ApiClient>,
}

impl App {
  pub fn new(
    client: ApiClient,
    station: Station,
    debounce: Duration,
    utc_offset: FixedOffset,
  ) -> Self {
    Self {
      station,
      debounce,
      utc_offset,
      input: String::new(),
      last_key: None,
      outcome: None,
      recent: Vec::new(),
      status_msg: String::new(),
      client: Arc::new(client),
    }
  }

  // ── Input ─────────────────────────────────────────────────────────────────

  /// Process a key event received at `now`.
  pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Command {
    if key.kind != KeyEventKind::Press {
      return Command::Continue;
    }
    // Scanners type letters, so only Ctrl-C quits.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return Command::Quit;
    }

    match key.code {
      KeyCode::Enter => {
        if let Some(code) = self.take_input() {
          return Command::Submit(code);
        }
      }
      KeyCode::Char(c) => {
        self.input.push(c);
        self.last_key = Some(now);
      }
      KeyCode::Backspace => {
        self.input.pop();
        self.last_key = Some(now);
      }
      KeyCode::Esc => {
        self.take_input();
      }
      KeyCode::Tab => {
        self.station = self.station.next();
        self.status_msg = format!("Station set to {}.", self.station.label());
      }
      _ => {}
    }
    Command::Continue
  }

  /// Returns the pending input once the keyboard has been idle for the
  /// debounce window.
  pub fn poll_idle(&mut self, now: Instant) -> Option<String> {
    let last = self.last_key?;
    if now.saturating_duration_since(last) < self.debounce {
      return None;
    }
    self.take_input()
  }

  /// Clear the input buffer, returning it when it holds anything but
  /// whitespace.
  fn take_input(&mut self) -> Option<String> {
    self.last_key = None;
    let code = std::mem::take(&mut self.input);
    (!code.trim().is_empty()).then_some(code)
  }

  // ── Server round-trips ────────────────────────────────────────────────────

  /// Send `code` to the server and show the result.
  pub async fn submit(&mut self, code: String) {
    match self.client.scan(&code, self.station).await {
      Ok(outcome) => self.apply_outcome(outcome),
      Err(e) => self.apply_error(&e),
    }
  }

  pub async fn refresh_recent(&mut self) -> anyhow::Result<()> {
    self.recent = self.client.recent().await?;
    Ok(())
  }

  pub fn apply_outcome(&mut self, outcome: ScanOutcome) {
    self.recent = outcome.recent.clone();
    self.status_msg = outcome.message.clone();
    self.outcome = Some(outcome);
  }

  /// A failed scan leaves the feed as it was and clears the student panel.
  pub fn apply_error(&mut self, err: &anyhow::Error) {
    self.outcome = None;
    self.status_msg = format!("Error: {err}");
  }

  /// `at` in school-local time.
  pub fn local_time(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.with_timezone(&self.utc_offset)
  }

  /// Whether the last scan recorded something.
  pub fn last_scan_recorded(&self) -> bool {
    self
      .outcome
      .as_ref()
      .is_some_and(|o| o.kind != ScanKind::NotFound)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone, Utc};
  use muster_core::{
    attendance::{AttendanceEvent, EventId},
    student::{Student, StudentProfile},
  };
  use uuid::Uuid;

  use super::*;

  fn app() -> App {
    let client = ApiClient::new("http://localhost:8080").unwrap();
    let offset = FixedOffset::east_opt(8 * 3600).unwrap();
    App::new(client, Station::Auto, Duration::from_millis(500), offset)
  }

  fn press(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  fn type_str(app: &mut App, s: &str, at: Instant) {
    for c in s.chars() {
      assert_eq!(app.handle_key(press(KeyCode::Char(c)), at), Command::Continue);
    }
  }

  fn entry(code: &str) -> ActivityEntry {
    let at = Utc.with_ymd_and_hms(2025, 6, 2, 0, 30, 0).unwrap();
    let student = Student {
      student_id: Uuid::new_v4(),
      scan_code:  code.into(),
      profile:    StudentProfile::default(),
      created_at: at,
      updated_at: at,
    };
    let event = AttendanceEvent {
      event_id:   EventId(1),
      student_id: student.student_id,
      date:       NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
      time_in:    Some(at),
      time_out:   None,
      created_at: at,
      updated_at: at,
    };
    ActivityEntry { event, student }
  }

  #[test]
  fn enter_submits_and_clears_input() {
    let mut app = app();
    let t0 = Instant::now();
    type_str(&mut app, "2025-0001", t0);
    assert_eq!(
      app.handle_key(press(KeyCode::Enter), t0),
      Command::Submit("2025-0001".into())
    );
    assert!(app.input.is_empty());
    // Nothing left for the idle timer to submit.
    assert_eq!(app.poll_idle(t0 + Duration::from_secs(1)), None);
  }

  #[test]
  fn enter_on_blank_input_does_nothing() {
    let mut app = app();
    let t0 = Instant::now();
    type_str(&mut app, "  ", t0);
    assert_eq!(app.handle_key(press(KeyCode::Enter), t0), Command::Continue);
    assert!(app.input.is_empty());
  }

  #[test]
  fn idle_input_submits_after_debounce() {
    let mut app = app();
    let t0 = Instant::now();
    type_str(&mut app, "2025-00", t0);
    type_str(&mut app, "02", t0 + Duration::from_millis(300));

    // Each keystroke restarts the window.
    assert_eq!(app.poll_idle(t0 + Duration::from_millis(700)), None);
    assert_eq!(app.input, "2025-0002");

    assert_eq!(
      app.poll_idle(t0 + Duration::from_millis(800)),
      Some("2025-0002".into())
    );
    assert!(app.input.is_empty());
    assert_eq!(app.poll_idle(t0 + Duration::from_secs(5)), None);
  }

  #[test]
  fn escape_and_backspace_edit_input() {
    let mut app = app();
    let t0 = Instant::now();
    type_str(&mut app, "abc", t0);
    app.handle_key(press(KeyCode::Backspace), t0);
    assert_eq!(app.input, "ab");
    app.handle_key(press(KeyCode::Esc), t0);
    assert!(app.input.is_empty());
    assert_eq!(app.poll_idle(t0 + Duration::from_secs(1)), None);
  }

  #[test]
  fn tab_cycles_station() {
    let mut app = app();
    let t0 = Instant::now();
    app.handle_key(press(KeyCode::Tab), t0);
    assert_eq!(app.station, Station::In);
    assert_eq!(app.station.action(), Some(ScanAction::TimeIn));
    app.handle_key(press(KeyCode::Tab), t0);
    assert_eq!(app.station, Station::Out);
    app.handle_key(press(KeyCode::Tab), t0);
    assert_eq!(app.station, Station::Auto);
    assert_eq!(app.station.action(), None);
  }

  #[test]
  fn ctrl_c_quits_but_q_is_input() {
    let mut app = app();
    let t0 = Instant::now();
    assert_eq!(app.handle_key(press(KeyCode::Char('q')), t0), Command::Continue);
    assert_eq!(app.input, "q");
    let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
    assert_eq!(app.handle_key(ctrl_c, t0), Command::Quit);
  }

  #[test]
  fn outcome_replaces_feed_and_error_keeps_it() {
    let mut app = app();
    let first = entry("2025-0001");
    let outcome = ScanOutcome::recorded(
      ScanKind::TimeIn,
      first.student.clone(),
      first.event.clone(),
      vec![first.clone()],
    );
    app.apply_outcome(outcome);
    assert!(app.last_scan_recorded());
    assert_eq!(app.status_msg, "Time In recorded.");
    assert_eq!(app.recent, vec![first.clone()]);

    app.apply_outcome(ScanOutcome::not_found(vec![first.clone()]));
    assert!(!app.last_scan_recorded());
    assert_eq!(app.status_msg, "Student not found.");

    app.apply_error(&anyhow::anyhow!("Attendance could not be recorded. Please try again."));
    assert!(app.outcome.is_none());
    assert_eq!(app.recent, vec![first]);
    assert!(app.status_msg.starts_with("Error: "));
  }

  #[test]
  fn times_are_shown_at_the_school_offset() {
    let app = app();
    // 23:30 UTC is already the next morning at +08:00.
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap();
    let local = app.local_time(at);
    assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2025-06-02 07:30");
  }

  #[test]
  fn station_reads_from_toml() {
    #[derive(Deserialize)]
    struct Cfg {
      station: Station,
    }
    let cfg: Cfg = toml::from_str(r#"station = "out""#).unwrap();
    assert_eq!(cfg.station, Station::Out);
  }
}
