//! The `Directory` and `AttendanceStore` traits.
//!
//! Both are implemented by storage backends (e.g. `muster-store-sqlite`).
//! The recorder and the API depend on these abstractions, not on a concrete
//! backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{
  attendance::{ActivityEntry, AttendanceEvent, EventId, NewEvent},
  student::{NewStudent, Student},
};

// ─── Write guard ─────────────────────────────────────────────────────────────

/// A precondition checked by the store in the same transaction as an insert.
///
/// Guards turn the recorder's read-decide-write into a compare-and-set: if
/// another station wrote in between, the insert is rejected instead of
/// producing a row decided on stale data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
  /// Insert unconditionally.
  Always,
  /// The student has no event with `time_out` unset on the event's date.
  NoOpenEvent,
  /// The student's latest event on the event's date is still this one
  /// (`None`: there is still no event that day).
  LatestIs(Option<EventId>),
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Lookup and maintenance of students.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve a scan code. Returns `None` if no student carries it.
  fn find_by_scan_code<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + 'a;

  fn get_student(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Student>, Self::Error>> + Send + '_;

  /// All students, ordered by scan code.
  fn list_students(
    &self,
  ) -> impl Future<Output = Result<Vec<Student>, Self::Error>> + Send + '_;

  /// Insert a student, or replace the profile of the student with the same
  /// scan code. The flag is `true` when a new student was created.
  fn upsert_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<(Student, bool), Self::Error>> + Send + '_;

  /// Like [`upsert_student`](Self::upsert_student), but an existing student
  /// only has the profile fields set in `input` overwritten.
  fn merge_student(
    &self,
    input: NewStudent,
  ) -> impl Future<Output = Result<(Student, bool), Self::Error>> + Send + '_;
}

// ─── Attendance store ────────────────────────────────────────────────────────

/// Persistence of attendance events.
///
/// "Latest" always means greatest `(created_at, event_id)`; "recent" means
/// greatest `(updated_at, event_id)`.
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert an event if `guard` still holds. Returns `None` when the guard
  /// was violated and nothing was written.
  fn create_event(
    &self,
    input: NewEvent,
    guard: Guard,
  ) -> impl Future<Output = Result<Option<AttendanceEvent>, Self::Error>> + Send + '_;

  /// The latest event of the student on `date` whose `time_out` is unset.
  fn find_open_event(
    &self,
    student_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceEvent>, Self::Error>> + Send + '_;

  /// The latest event of the student on `date`, open or not.
  fn find_latest_event(
    &self,
    student_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceEvent>, Self::Error>> + Send + '_;

  /// Set `time_out` (and `updated_at`) to `at`, but only if `time_out` is
  /// still unset. Returns the re-read event, or `None` if the event was
  /// already closed or does not exist.
  fn set_time_out(
    &self,
    event_id: EventId,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<AttendanceEvent>, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    event_id: EventId,
  ) -> impl Future<Output = Result<Option<AttendanceEvent>, Self::Error>> + Send + '_;

  /// The `limit` most recently updated events across all students.
  fn recent(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ActivityEntry>, Self::Error>> + Send + '_;

  /// Every event on `date`, latest first.
  fn events_on(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<ActivityEntry>, Self::Error>> + Send + '_;
}
