//! [`SqliteStore`] — the SQLite implementation of [`Directory`] and
//! [`AttendanceStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use muster_core::{
  attendance::{ActivityEntry, AttendanceEvent, EventId, NewEvent},
  store::{AttendanceStore, Directory, Guard},
  student::{NewStudent, Student},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    EVENT_COLUMNS, RawActivity, RawEvent, RawStudent, STUDENT_COLUMNS, encode_date, encode_dt,
    encode_sex, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── SQL ─────────────────────────────────────────────────────────────────────

const LATEST_FIRST: &str = "ORDER BY e.created_at DESC, e.event_id DESC";

fn select_events(tail: &str) -> String {
  format!("SELECT {EVENT_COLUMNS} FROM attendance_events e {tail}")
}

fn select_activity(tail: &str) -> String {
  format!(
    "SELECT {EVENT_COLUMNS}, {STUDENT_COLUMNS}
     FROM attendance_events e
     JOIN students s ON s.student_id = e.student_id
     {tail}"
  )
}

const REPLACE_PROFILE: &str = "UPDATE students SET
     first_name = ?2, middle_name = ?3, last_name = ?4, sex = ?5,
     department = ?6, year_level = ?7, date_of_birth = ?8, photo = ?9,
     updated_at = ?10
   WHERE scan_code = ?1";

/// NULL parameters keep the stored value.
const MERGE_PROFILE: &str = "UPDATE students SET
     first_name    = COALESCE(?2, first_name),
     middle_name   = COALESCE(?3, middle_name),
     last_name     = COALESCE(?4, last_name),
     sex           = COALESCE(?5, sex),
     department    = COALESCE(?6, department),
     year_level    = COALESCE(?7, year_level),
     date_of_birth = COALESCE(?8, date_of_birth),
     photo         = COALESCE(?9, photo),
     updated_at    = ?10
   WHERE scan_code = ?1";

fn select_students(tail: &str) -> String {
  format!("SELECT {STUDENT_COLUMNS} FROM students s {tail}")
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Muster store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_event(&self, sql: String, params: Vec<Value>) -> Result<Option<AttendanceEvent>> {
    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params), |row| RawEvent::read(row, 0))
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn query_activity(&self, sql: String, params: Vec<Value>) -> Result<Vec<ActivityEntry>> {
    let raws: Vec<RawActivity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawActivity::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawActivity::into_entry).collect()
  }

  async fn query_student(&self, sql: String, params: Vec<Value>) -> Result<Option<Student>> {
    let raw: Option<RawStudent> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params), |row| RawStudent::read(row, 0))
            .optional()?,
        )
      })
      .await?;

    raw.map(RawStudent::into_student).transpose()
  }
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  type Error = crate::Error;

  async fn find_by_scan_code(&self, code: &str) -> Result<Option<Student>> {
    self
      .query_student(select_students("WHERE s.scan_code = ?1"), vec![Value::Text(code.to_owned())])
      .await
  }

  async fn get_student(&self, id: Uuid) -> Result<Option<Student>> {
    self
      .query_student(select_students("WHERE s.student_id = ?1"), vec![Value::Text(encode_uuid(id))])
      .await
  }

  async fn list_students(&self) -> Result<Vec<Student>> {
    let sql = select_students("ORDER BY s.scan_code");

    let raws: Vec<RawStudent> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| RawStudent::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStudent::into_student).collect()
  }

  async fn upsert_student(&self, input: NewStudent) -> Result<(Student, bool)> {
    self.write_student(input, REPLACE_PROFILE).await
  }

  async fn merge_student(&self, input: NewStudent) -> Result<(Student, bool)> {
    self.write_student(input, MERGE_PROFILE).await
  }
}

impl SqliteStore {
  /// Insert or update by scan code; `update_sql` decides how an existing
  /// profile is overwritten.
  async fn write_student(&self, input: NewStudent, update_sql: &'static str) -> Result<(Student, bool)> {
    let new_id     = encode_uuid(Uuid::new_v4());
    let now_str    = encode_dt(Utc::now());
    let p          = input.profile;
    let scan_code  = input.scan_code;
    let sex        = p.sex.map(encode_sex);
    let year_level = p.year_level.map(i64::from);
    let dob        = p.date_of_birth.map(encode_date);
    let select_sql = select_students("WHERE s.scan_code = ?1");

    let (raw, created): (RawStudent, bool) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
          .query_row(
            "SELECT student_id FROM students WHERE scan_code = ?1",
            rusqlite::params![scan_code],
            |r| r.get(0),
          )
          .optional()?;

        let created = existing.is_none();
        if created {
          tx.execute(
            "INSERT INTO students (
               student_id, scan_code, first_name, middle_name, last_name, sex,
               department, year_level, date_of_birth, photo, created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            rusqlite::params![
              new_id,
              scan_code,
              p.first_name,
              p.middle_name,
              p.last_name,
              sex,
              p.department,
              year_level,
              dob,
              p.photo,
              now_str,
            ],
          )?;
        } else {
          tx.execute(
            update_sql,
            rusqlite::params![
              scan_code,
              p.first_name,
              p.middle_name,
              p.last_name,
              sex,
              p.department,
              year_level,
              dob,
              p.photo,
              now_str,
            ],
          )?;
        }

        let raw = tx.query_row(&select_sql, rusqlite::params![scan_code], |row| {
          RawStudent::read(row, 0)
        })?;
        tx.commit()?;
        Ok((raw, created))
      })
      .await?;

    Ok((raw.into_student()?, created))
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = crate::Error;

  async fn create_event(&self, input: NewEvent, guard: Guard) -> Result<Option<AttendanceEvent>> {
    let student_id = encode_uuid(input.student_id);
    let date       = encode_date(input.date);
    let time_in    = input.time_in.map(encode_dt);
    let time_out   = input.time_out.map(encode_dt);
    let at         = encode_dt(input.at);
    let open_sql   = select_events("WHERE e.student_id = ?1 AND e.date = ?2 AND e.time_out IS NULL LIMIT 1");
    let latest_sql = format!(
      "SELECT e.event_id FROM attendance_events e
       WHERE e.student_id = ?1 AND e.date = ?2 {LATEST_FIRST} LIMIT 1"
    );
    let read_sql   = select_events("WHERE e.event_id = ?1");

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let holds = match guard {
          Guard::Always => true,
          Guard::NoOpenEvent => tx
            .query_row(&open_sql, rusqlite::params![student_id, date], |_| Ok(()))
            .optional()?
            .is_none(),
          Guard::LatestIs(expected) => {
            let latest: Option<i64> = tx
              .query_row(&latest_sql, rusqlite::params![student_id, date], |r| r.get(0))
              .optional()?;
            latest == expected.map(|id| id.0)
          }
        };
        if !holds {
          // Dropping the transaction rolls it back.
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO attendance_events (student_id, date, time_in, time_out, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![student_id, date, time_in, time_out, at],
        )?;
        let id = tx.last_insert_rowid();
        let raw = tx.query_row(&read_sql, rusqlite::params![id], |row| RawEvent::read(row, 0))?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    if raw.is_none() {
      debug!(?guard, "event insert rejected by guard");
    }
    raw.map(RawEvent::into_event).transpose()
  }

  async fn find_open_event(&self, student_id: Uuid, date: NaiveDate) -> Result<Option<AttendanceEvent>> {
    self
      .query_event(
        select_events(&format!(
          "WHERE e.student_id = ?1 AND e.date = ?2 AND e.time_out IS NULL {LATEST_FIRST} LIMIT 1"
        )),
        vec![Value::Text(encode_uuid(student_id)), Value::Text(encode_date(date))],
      )
      .await
  }

  async fn find_latest_event(&self, student_id: Uuid, date: NaiveDate) -> Result<Option<AttendanceEvent>> {
    self
      .query_event(
        select_events(&format!("WHERE e.student_id = ?1 AND e.date = ?2 {LATEST_FIRST} LIMIT 1")),
        vec![Value::Text(encode_uuid(student_id)), Value::Text(encode_date(date))],
      )
      .await
  }

  async fn set_time_out(&self, event_id: EventId, at: DateTime<Utc>) -> Result<Option<AttendanceEvent>> {
    let id       = event_id.0;
    let at_str   = encode_dt(at);
    let read_sql = select_events("WHERE e.event_id = ?1");

    let raw: Option<RawEvent> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let changed = tx.execute(
          "UPDATE attendance_events SET time_out = ?2, updated_at = ?2
           WHERE event_id = ?1 AND time_out IS NULL",
          rusqlite::params![id, at_str],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(&read_sql, rusqlite::params![id], |row| RawEvent::read(row, 0))?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    if raw.is_none() {
      debug!(%event_id, "time-out rejected, event already closed or missing");
    }
    raw.map(RawEvent::into_event).transpose()
  }

  async fn get_event(&self, event_id: EventId) -> Result<Option<AttendanceEvent>> {
    self
      .query_event(select_events("WHERE e.event_id = ?1"), vec![Value::Integer(event_id.0)])
      .await
  }

  async fn recent(&self, limit: usize) -> Result<Vec<ActivityEntry>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self
      .query_activity(
        select_activity("ORDER BY e.updated_at DESC, e.event_id DESC LIMIT ?1"),
        vec![Value::Integer(limit)],
      )
      .await
  }

  async fn events_on(&self, date: NaiveDate) -> Result<Vec<ActivityEntry>> {
    self
      .query_activity(
        select_activity(&format!("WHERE e.date = ?1 {LATEST_FIRST}")),
        vec![Value::Text(encode_date(date))],
      )
      .await
  }
}
