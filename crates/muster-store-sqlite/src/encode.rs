//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed six-digit
//! fraction, so `ORDER BY` on the text column is chronological. Dates are
//! `YYYY-MM-DD`. UUIDs are hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use muster_core::{
  attendance::{ActivityEntry, AttendanceEvent, EventId},
  student::{Sex, Student, StudentProfile},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Column lists ────────────────────────────────────────────────────────────

/// Columns read by [`RawEvent::read`], for a table aliased `e`.
pub const EVENT_COLUMNS: &str =
  "e.event_id, e.student_id, e.date, e.time_in, e.time_out, e.created_at, e.updated_at";
const EVENT_COLUMN_COUNT: usize = 7;

/// Columns read by [`RawStudent::read`], for a table aliased `s`.
pub const STUDENT_COLUMNS: &str = "s.student_id, s.scan_code, s.first_name, s.middle_name, \
   s.last_name, s.sex, s.department, s.year_level, s.date_of_birth, s.photo, \
   s.created_at, s.updated_at";

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Sex ─────────────────────────────────────────────────────────────────────

pub fn encode_sex(sex: Sex) -> &'static str {
  match sex {
    Sex::Male => "male",
    Sex::Female => "female",
  }
}

pub fn decode_sex(s: &str) -> Result<Sex> {
  match s {
    "male" => Ok(Sex::Male),
    "female" => Ok(Sex::Female),
    other => Err(Error::Decode { column: "sex", value: other.to_owned() }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `attendance_events` row.
pub struct RawEvent {
  pub event_id:   i64,
  pub student_id: String,
  pub date:       String,
  pub time_in:    Option<String>,
  pub time_out:   Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawEvent {
  /// Read [`EVENT_COLUMNS`] starting at column `at`.
  pub fn read(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      event_id:   row.get(at)?,
      student_id: row.get(at + 1)?,
      date:       row.get(at + 2)?,
      time_in:    row.get(at + 3)?,
      time_out:   row.get(at + 4)?,
      created_at: row.get(at + 5)?,
      updated_at: row.get(at + 6)?,
    })
  }

  pub fn into_event(self) -> Result<AttendanceEvent> {
    Ok(AttendanceEvent {
      event_id:   EventId(self.event_id),
      student_id: decode_uuid(&self.student_id)?,
      date:       decode_date(&self.date)?,
      time_in:    self.time_in.as_deref().map(decode_dt).transpose()?,
      time_out:   self.time_out.as_deref().map(decode_dt).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `students` row.
pub struct RawStudent {
  pub student_id:    String,
  pub scan_code:     String,
  pub first_name:    Option<String>,
  pub middle_name:   Option<String>,
  pub last_name:     Option<String>,
  pub sex:           Option<String>,
  pub department:    Option<String>,
  pub year_level:    Option<i64>,
  pub date_of_birth: Option<String>,
  pub photo:         Option<String>,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawStudent {
  /// Read [`STUDENT_COLUMNS`] starting at column `at`.
  pub fn read(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      student_id:    row.get(at)?,
      scan_code:     row.get(at + 1)?,
      first_name:    row.get(at + 2)?,
      middle_name:   row.get(at + 3)?,
      last_name:     row.get(at + 4)?,
      sex:           row.get(at + 5)?,
      department:    row.get(at + 6)?,
      year_level:    row.get(at + 7)?,
      date_of_birth: row.get(at + 8)?,
      photo:         row.get(at + 9)?,
      created_at:    row.get(at + 10)?,
      updated_at:    row.get(at + 11)?,
    })
  }

  pub fn into_student(self) -> Result<Student> {
    let year_level = self
      .year_level
      .map(|y| {
        u8::try_from(y).map_err(|_| Error::Decode { column: "year_level", value: y.to_string() })
      })
      .transpose()?;

    Ok(Student {
      student_id: decode_uuid(&self.student_id)?,
      scan_code:  self.scan_code,
      profile:    StudentProfile {
        first_name: self.first_name,
        middle_name: self.middle_name,
        last_name: self.last_name,
        sex: self.sex.as_deref().map(decode_sex).transpose()?,
        department: self.department,
        year_level,
        date_of_birth: self.date_of_birth.as_deref().map(decode_date).transpose()?,
        photo: self.photo,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// An event row joined with its student: [`EVENT_COLUMNS`] then
/// [`STUDENT_COLUMNS`].
pub struct RawActivity {
  pub event:   RawEvent,
  pub student: RawStudent,
}

impl RawActivity {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      event:   RawEvent::read(row, 0)?,
      student: RawStudent::read(row, EVENT_COLUMN_COUNT)?,
    })
  }

  pub fn into_entry(self) -> Result<ActivityEntry> {
    Ok(ActivityEntry {
      event:   self.event.into_event()?,
      student: self.student.into_student()?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Timelike};

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let whole = Utc.with_ymd_and_hms(2025, 8, 11, 7, 30, 1).unwrap();
    let half = whole.with_nanosecond(500_000_000).unwrap();
    assert!(encode_dt(whole) < encode_dt(half));
    assert_eq!(encode_dt(whole).len(), encode_dt(half).len());
    assert_eq!(decode_dt(&encode_dt(half)).unwrap(), half);
  }

  #[test]
  fn unknown_sex_is_a_decode_error() {
    assert!(matches!(decode_sex("x"), Err(Error::Decode { column: "sex", .. })));
  }
}
