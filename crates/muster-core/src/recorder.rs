//! [`Recorder`] — turns a scan into exactly one attendance write.
//!
//! The recorder is stateless between calls. Each scan resolves the student,
//! reads today's events, runs the decision table and applies the chosen
//! write through a store-side guard. A rejected guard means another station
//! wrote in between; the recorder then re-reads and decides again, once.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset as _, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  attendance::{ActivityEntry, AttendanceEvent, NewEvent},
  clock::{Clock, SystemClock},
  decision::{DaySnapshot, Mode, Write, decide},
  scan::{ScanAction, ScanCode, ScanOutcome, ScanRequest},
  store::{AttendanceStore, Directory},
};

/// Size of the recent-activity feed attached to each outcome.
pub const DEFAULT_RECENT_LIMIT: usize = 2;

/// One initial attempt plus one retry on fresh data.
const MAX_ATTEMPTS: u32 = 2;

pub struct Recorder<D, S> {
  directory:    D,
  store:        S,
  clock:        Arc<dyn Clock>,
  utc_offset:   FixedOffset,
  recent_limit: usize,
}

impl<D, S> Recorder<D, S>
where
  D: Directory,
  S: AttendanceStore,
{
  /// A recorder on the system clock, with school days in UTC.
  pub fn new(directory: D, store: S) -> Self {
    Self {
      directory,
      store,
      clock: Arc::new(SystemClock),
      utc_offset: Utc.fix(),
      recent_limit: DEFAULT_RECENT_LIMIT,
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Offset used to decide which calendar day a scan belongs to.
  pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
    self.utc_offset = offset;
    self
  }

  pub fn with_recent_limit(mut self, limit: usize) -> Self {
    self.recent_limit = limit;
    self
  }

  pub fn directory(&self) -> &D { &self.directory }

  pub fn store(&self) -> &S { &self.store }

  /// The current school day.
  pub fn today(&self) -> NaiveDate { self.day_of(self.clock.now()) }

  fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&self.utc_offset).date_naive()
  }

  // ── Operations ────────────────────────────────────────────────────────────

  /// Record a station submission; a missing action means auto-detect.
  pub async fn record(&self, request: &ScanRequest) -> Result<ScanOutcome> {
    self.process(&request.code, Mode::from(request.action)).await
  }

  /// Record a scan whose direction the station declared.
  pub async fn record_explicit(&self, code: &str, action: ScanAction) -> Result<ScanOutcome> {
    self.process(code, Mode::Explicit(action)).await
  }

  /// Record a scan, inferring the direction from today's latest event.
  pub async fn record_auto(&self, code: &str) -> Result<ScanOutcome> {
    self.process(code, Mode::Auto).await
  }

  /// The `limit` most recently updated events, newest first.
  pub async fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityEntry>> {
    self.store.recent(limit).await.map_err(Error::store)
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  async fn process(&self, raw_code: &str, mode: Mode) -> Result<ScanOutcome> {
    let code = ScanCode::parse(raw_code)?;

    let student = self
      .directory
      .find_by_scan_code(code.as_str())
      .await
      .map_err(Error::store)?;

    let Some(student) = student else {
      info!(%code, "scan code matched no student");
      let recent = self.recent_activity(self.recent_limit).await?;
      return Ok(ScanOutcome::not_found(recent));
    };

    for attempt in 1..=MAX_ATTEMPTS {
      let now = self.clock.now();
      let today = self.day_of(now);

      let day = self.snapshot(mode, student.student_id, today).await?;
      let decision = decide(mode, &day);

      match self.apply(decision.write, student.student_id, today, now).await? {
        Some(event) => {
          info!(
            student_id = %student.student_id,
            event_id = %event.event_id,
            kind = ?decision.kind,
            "scan recorded"
          );
          let recent = self.recent_activity(self.recent_limit).await?;
          return Ok(ScanOutcome::recorded(decision.kind, student, event, recent));
        }
        None => warn!(
          student_id = %student.student_id,
          attempt,
          write = ?decision.write,
          "attendance changed between read and write"
        ),
      }
    }

    Err(Error::ConcurrentModification(student.student_id))
  }

  async fn snapshot(&self, mode: Mode, student_id: Uuid, date: NaiveDate) -> Result<DaySnapshot> {
    let mut day = DaySnapshot::default();
    match mode {
      Mode::Explicit(ScanAction::TimeIn) => {}
      Mode::Explicit(ScanAction::TimeOut) => {
        day.open = self
          .store
          .find_open_event(student_id, date)
          .await
          .map_err(Error::store)?;
      }
      Mode::Auto => {
        day.latest = self
          .store
          .find_latest_event(student_id, date)
          .await
          .map_err(Error::store)?;
      }
    }
    Ok(day)
  }

  /// Returns `None` when the store rejected the write.
  async fn apply(
    &self,
    write: Write,
    student_id: Uuid,
    date: NaiveDate,
    now: DateTime<Utc>,
  ) -> Result<Option<AttendanceEvent>> {
    match write {
      Write::Insert { direction, guard } => {
        let input = match direction {
          ScanAction::TimeIn => NewEvent::time_in(student_id, date, now),
          ScanAction::TimeOut => NewEvent::time_out(student_id, date, now),
        };
        self.store.create_event(input, guard).await.map_err(Error::store)
      }
      Write::Close(event_id) => self.store.set_time_out(event_id, now).await.map_err(Error::store),
    }
  }
}
