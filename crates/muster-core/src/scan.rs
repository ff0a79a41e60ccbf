//! Scan submissions and their results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  attendance::{ActivityEntry, AttendanceEvent},
  student::Student,
};

/// Longest scan code accepted from a station.
pub const MAX_SCAN_CODE_LEN: usize = 64;

// ─── Scan code ───────────────────────────────────────────────────────────────

/// A validated scan code.
///
/// Scanners emulate a keyboard and usually terminate the code with CR/LF, so
/// surrounding whitespace and control characters are stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCode(String);

impl ScanCode {
  pub fn parse(raw: &str) -> Result<Self> {
    let code = raw.trim_matches(|c: char| c.is_whitespace() || c.is_control());

    if code.is_empty()
      || code.chars().count() > MAX_SCAN_CODE_LEN
      || code.chars().any(char::is_control)
    {
      return Err(Error::InvalidScanCode(raw.to_owned()));
    }
    Ok(Self(code.to_owned()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ScanCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

// ─── Action ──────────────────────────────────────────────────────────────────

/// The direction a station declares for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanAction {
  #[serde(rename = "in")]
  TimeIn,
  #[serde(rename = "out")]
  TimeOut,
}

impl ScanAction {
  /// Parse a station's action string. Absent or blank means auto-detect.
  pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
      return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
      "in" => Ok(Some(ScanAction::TimeIn)),
      "out" => Ok(Some(ScanAction::TimeOut)),
      _ => Err(Error::InvalidAction(raw.to_owned())),
    }
  }
}

/// A submission from a scan station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
  pub code:   String,
  /// `None` lets the recorder infer the direction.
  #[serde(default)]
  pub action: Option<ScanAction>,
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a scan did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanKind {
  NotFound,
  TimeIn,
  TimeOut,
  /// Time-out with no open event to close.
  OrphanTimeOut,
  /// Auto mode started a new cycle after a completed one.
  NewTimeIn,
}

impl ScanKind {
  pub fn message(self) -> &'static str {
    match self {
      ScanKind::NotFound => "Student not found.",
      ScanKind::TimeIn => "Time In recorded.",
      ScanKind::TimeOut => "Time Out recorded.",
      ScanKind::OrphanTimeOut => "Time Out recorded (no Time In found).",
      ScanKind::NewTimeIn => "New Time In recorded.",
    }
  }
}

/// The display payload returned for every scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanOutcome {
  pub kind:    ScanKind,
  pub message: String,
  pub student: Option<Student>,
  /// The created or updated event, as persisted.
  pub event:   Option<AttendanceEvent>,
  pub recent:  Vec<ActivityEntry>,
}

impl ScanOutcome {
  pub fn not_found(recent: Vec<ActivityEntry>) -> Self {
    Self {
      kind: ScanKind::NotFound,
      message: ScanKind::NotFound.message().to_owned(),
      student: None,
      event: None,
      recent,
    }
  }

  pub fn recorded(
    kind: ScanKind,
    student: Student,
    event: AttendanceEvent,
    recent: Vec<ActivityEntry>,
  ) -> Self {
    Self {
      kind,
      message: kind.message().to_owned(),
      student: Some(student),
      event: Some(event),
      recent,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scan_code_strips_scanner_terminators() {
    let code = ScanCode::parse("  2025-0002\r\n").unwrap();
    assert_eq!(code.as_str(), "2025-0002");
  }

  #[test]
  fn scan_code_rejects_blank_and_oversized() {
    assert!(matches!(ScanCode::parse(" \t\n"), Err(Error::InvalidScanCode(_))));
    let long = "9".repeat(MAX_SCAN_CODE_LEN + 1);
    assert!(matches!(ScanCode::parse(&long), Err(Error::InvalidScanCode(_))));
    assert!(matches!(ScanCode::parse("20\u{7}25"), Err(Error::InvalidScanCode(_))));
  }

  #[test]
  fn action_parsing() {
    assert_eq!(ScanAction::parse_optional(None).unwrap(), None);
    assert_eq!(ScanAction::parse_optional(Some(" ")).unwrap(), None);
    assert_eq!(
      ScanAction::parse_optional(Some("IN")).unwrap(),
      Some(ScanAction::TimeIn)
    );
    assert_eq!(
      ScanAction::parse_optional(Some("out")).unwrap(),
      Some(ScanAction::TimeOut)
    );
    let err = ScanAction::parse_optional(Some("sideways")).unwrap_err();
    assert_eq!(err.user_message(), "Invalid action.");
  }

  #[test]
  fn request_action_wire_format() {
    let req: ScanRequest =
      serde_json::from_str(r#"{"code":"2025-0001","action":"out"}"#).unwrap();
    assert_eq!(req.action, Some(ScanAction::TimeOut));

    let req: ScanRequest = serde_json::from_str(r#"{"code":"2025-0001","action":null}"#).unwrap();
    assert_eq!(req.action, None);
  }
}
