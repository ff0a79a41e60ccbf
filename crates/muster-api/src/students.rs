//! Handlers for `/students` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/students` | Ordered by scan code |
//! | `POST` | `/students` | Body: [`NewStudent`]; 201 when created, 200 when updated |
//! | `GET`  | `/students/{id}` | 404 if not found |
//! | `GET`  | `/students/by-code/{code}` | 404 if not found |
//! | `POST` | `/students/import` | Body: array of `{"Column":"value"}` rows |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use muster_core::{
  import::{ImportReport, Row, import_roster},
  scan::ScanCode,
  store::{AttendanceStore, Directory},
  student::{NewStudent, Student},
};
use tracing::info;
use uuid::Uuid;

use crate::{SharedRecorder, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /students`
pub async fn list<S>(
  State(recorder): State<SharedRecorder<S>>,
) -> Result<Json<Vec<Student>>, ApiError>
where
  S: Directory + AttendanceStore,
{
  let students = recorder
    .directory()
    .list_students()
    .await
    .map_err(muster_core::Error::store)?;
  Ok(Json(students))
}

// ─── Create / update ──────────────────────────────────────────────────────────

/// `POST /students` — upsert keyed by scan code.
pub async fn create<S>(
  State(recorder): State<SharedRecorder<S>>,
  Json(mut body): Json<NewStudent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Directory + AttendanceStore,
{
  body.scan_code = ScanCode::parse(&body.scan_code)?.as_str().to_owned();

  let (student, created) = recorder
    .directory()
    .upsert_student(body)
    .await
    .map_err(muster_core::Error::store)?;

  let status = if created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(student)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /students/{id}`
pub async fn get_one<S>(
  State(recorder): State<SharedRecorder<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Student>, ApiError>
where
  S: Directory + AttendanceStore,
{
  let student = recorder
    .directory()
    .get_student(id)
    .await
    .map_err(muster_core::Error::store)?
    .ok_or_else(|| ApiError::NotFound(format!("student {id} not found")))?;
  Ok(Json(student))
}

/// `GET /students/by-code/{code}`
pub async fn by_code<S>(
  State(recorder): State<SharedRecorder<S>>,
  Path(code): Path<String>,
) -> Result<Json<Student>, ApiError>
where
  S: Directory + AttendanceStore,
{
  let code = ScanCode::parse(&code)?;
  let student = recorder
    .directory()
    .find_by_scan_code(code.as_str())
    .await
    .map_err(muster_core::Error::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no student with scan code {code}")))?;
  Ok(Json(student))
}

// ─── Import ───────────────────────────────────────────────────────────────────

/// `POST /students/import`
pub async fn import<S>(
  State(recorder): State<SharedRecorder<S>>,
  Json(rows): Json<Vec<Row>>,
) -> Result<Json<ImportReport>, ApiError>
where
  S: Directory + AttendanceStore,
{
  let report = import_roster(recorder.directory(), &rows).await?;
  info!(
    rows = rows.len(),
    created = report.created,
    updated = report.updated,
    rows_failed = report.rows_failed.len(),
    field_failures = report.field_failures.len(),
    "roster imported"
  );
  Ok(Json(report))
}
