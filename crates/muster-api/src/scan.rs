//! Handlers for scan stations.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/scan` | Body: `{"code":"...","action":"in"\|"out"\|null}` |
//! | `POST` | `/scan/in` | Body: `{"code":"..."}`; pinned time-in station |
//! | `POST` | `/scan/out` | Body: `{"code":"..."}`; pinned time-out station |
//! | `GET`  | `/recent` | Optional `?limit=` (default 2, max 50) |
//!
//! An unknown scan code is a normal outcome and answers `200` with
//! `kind: "not_found"`.

use axum::{
  Json,
  extract::{Query, State},
};
use muster_core::{
  attendance::ActivityEntry,
  recorder::DEFAULT_RECENT_LIMIT,
  scan::{ScanAction, ScanOutcome, ScanRequest},
  store::{AttendanceStore, Directory},
};
use serde::Deserialize;

use crate::{SharedRecorder, error::ApiError};

/// Upper bound for `GET /recent?limit=`.
pub const MAX_RECENT_LIMIT: usize = 50;

// ─── Submit ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /scan`.
///
/// `action` is kept as a string so an unknown value answers with the
/// station-facing "Invalid action." message.
#[derive(Debug, Deserialize)]
pub struct ScanBody {
  pub code:   String,
  pub action: Option<String>,
}

/// `POST /scan`
pub async fn submit<S>(
  State(recorder): State<SharedRecorder<S>>,
  Json(body): Json<ScanBody>,
) -> Result<Json<ScanOutcome>, ApiError>
where
  S: Directory + AttendanceStore,
{
  let request = ScanRequest {
    action: ScanAction::parse_optional(body.action.as_deref())?,
    code:   body.code,
  };
  Ok(Json(recorder.record(&request).await?))
}

#[derive(Debug, Deserialize)]
pub struct CodeBody {
  pub code: String,
}

/// `POST /scan/in`
pub async fn submit_in<S>(
  State(recorder): State<SharedRecorder<S>>,
  Json(body): Json<CodeBody>,
) -> Result<Json<ScanOutcome>, ApiError>
where
  S: Directory + AttendanceStore,
{
  Ok(Json(recorder.record_explicit(&body.code, ScanAction::TimeIn).await?))
}

/// `POST /scan/out`
pub async fn submit_out<S>(
  State(recorder): State<SharedRecorder<S>>,
  Json(body): Json<CodeBody>,
) -> Result<Json<ScanOutcome>, ApiError>
where
  S: Directory + AttendanceStore,
{
  Ok(Json(recorder.record_explicit(&body.code, ScanAction::TimeOut).await?))
}

// ─── Recent ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RecentParams {
  pub limit: Option<usize>,
}

/// `GET /recent[?limit=<n>]`
pub async fn recent<S>(
  State(recorder): State<SharedRecorder<S>>,
  Query(params): Query<RecentParams>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError>
where
  S: Directory + AttendanceStore,
{
  let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT).min(MAX_RECENT_LIMIT);
  Ok(Json(recorder.recent_activity(limit).await?))
}
