//! Handler for `GET /attendance`.
//!
//! Lists every event of one school day, joined with its student, latest
//! first. `?date=YYYY-MM-DD` defaults to today.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use muster_core::{
  attendance::ActivityEntry,
  store::{AttendanceStore, Directory},
};
use serde::Deserialize;

use crate::{SharedRecorder, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub date: Option<NaiveDate>,
}

/// `GET /attendance[?date=<YYYY-MM-DD>]`
pub async fn list<S>(
  State(recorder): State<SharedRecorder<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError>
where
  S: Directory + AttendanceStore,
{
  let date = params.date.unwrap_or_else(|| recorder.today());
  let entries = recorder
    .store()
    .events_on(date)
    .await
    .map_err(muster_core::Error::store)?;
  Ok(Json(entries))
}
