//! Attendance events.
//!
//! One row per in/out cycle. A student may have several events on the same
//! date; the newest is found by `(created_at, event_id)` so that ties under a
//! coarse clock still resolve deterministically.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::student::Student;

/// Store-assigned, strictly increasing event identifier.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A persisted attendance event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEvent {
  pub event_id:   EventId,
  pub student_id: Uuid,
  /// The school day the event belongs to.
  pub date:       NaiveDate,
  pub time_in:    Option<DateTime<Utc>>,
  pub time_out:   Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl AttendanceEvent {
  /// Timed in and not yet timed out.
  pub fn is_open(&self) -> bool { self.time_in.is_some() && self.time_out.is_none() }

  pub fn is_complete(&self) -> bool { self.time_in.is_some() && self.time_out.is_some() }

  /// Created by a time-out scan that found nothing to close.
  pub fn is_orphan(&self) -> bool { self.time_in.is_none() && self.time_out.is_some() }

  /// Key used for "latest event" queries.
  pub fn creation_key(&self) -> (DateTime<Utc>, EventId) { (self.created_at, self.event_id) }

  /// Key used for the recent-activity feed.
  pub fn update_key(&self) -> (DateTime<Utc>, EventId) { (self.updated_at, self.event_id) }
}

/// Input to [`AttendanceStore::create_event`](crate::store::AttendanceStore::create_event).
///
/// `at` becomes both `created_at` and `updated_at` of the new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
  pub student_id: Uuid,
  pub date:       NaiveDate,
  pub time_in:    Option<DateTime<Utc>>,
  pub time_out:   Option<DateTime<Utc>>,
  pub at:         DateTime<Utc>,
}

impl NewEvent {
  /// An event opened by a time-in scan.
  pub fn time_in(student_id: Uuid, date: NaiveDate, at: DateTime<Utc>) -> Self {
    Self { student_id, date, time_in: Some(at), time_out: None, at }
  }

  /// An orphan out-event.
  pub fn time_out(student_id: Uuid, date: NaiveDate, at: DateTime<Utc>) -> Self {
    Self { student_id, date, time_in: None, time_out: Some(at), at }
  }
}

/// An event paired with the student it belongs to, as shown in feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub event:   AttendanceEvent,
  pub student: Student,
}
