//! Router tests over an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode},
};
use chrono::{Duration, TimeZone, Utc};
use muster_core::{clock::ManualClock, recorder::Recorder};
use muster_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::api_router;

async fn app() -> (Router, Arc<ManualClock>) {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 8, 11, 7, 30, 0).unwrap()));
  let recorder = Recorder::new(store.clone(), store).with_clock(clock.clone());
  (api_router(Arc::new(recorder)), clock)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(json) => builder
      .header("content-type", "application/json")
      .body(Body::from(json.to_string())),
    None => builder.body(Body::empty()),
  }
  .unwrap();

  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn enroll(app: &Router, code: &str) {
  let (status, _) = send(
    app,
    "POST",
    "/students",
    Some(json!({ "scan_code": code, "profile": { "first_name": "Maria" } })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn unknown_code_is_a_normal_outcome() {
  let (app, _) = app().await;
  let (status, body) = send(&app, "POST", "/scan", Some(json!({ "code": "2025-0001" }))).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["kind"], "not_found");
  assert_eq!(body["message"], "Student not found.");
  assert!(body["student"].is_null());
  assert!(body["event"].is_null());
}

#[tokio::test]
async fn auto_scan_times_in_then_out() {
  let (app, clock) = app().await;
  enroll(&app, "2025-0002").await;

  let (status, body) =
    send(&app, "POST", "/scan", Some(json!({ "code": "2025-0002", "action": null }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Time In recorded.");
  assert_eq!(body["student"]["scan_code"], "2025-0002");
  assert!(body["event"]["time_out"].is_null());
  assert_eq!(body["recent"].as_array().unwrap().len(), 1);

  clock.advance(Duration::hours(8));
  let (_, body) = send(&app, "POST", "/scan", Some(json!({ "code": "2025-0002" }))).await;
  assert_eq!(body["message"], "Time Out recorded.");
  assert!(!body["event"]["time_out"].is_null());
}

#[tokio::test]
async fn pinned_stations_use_explicit_actions() {
  let (app, _) = app().await;
  enroll(&app, "2025-0002").await;

  let (_, body) = send(&app, "POST", "/scan/out", Some(json!({ "code": "2025-0002" }))).await;
  assert_eq!(body["kind"], "orphan_time_out");
  assert_eq!(body["message"], "Time Out recorded (no Time In found).");

  let (_, first) = send(&app, "POST", "/scan/in", Some(json!({ "code": "2025-0002" }))).await;
  let (_, second) = send(&app, "POST", "/scan/in", Some(json!({ "code": "2025-0002" }))).await;
  assert_eq!(second["message"], "Time In recorded.");
  assert_ne!(first["event"]["event_id"], second["event"]["event_id"]);

  let (_, listing) = send(&app, "GET", "/attendance?date=2025-08-11", None).await;
  assert_eq!(listing.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_input_is_rejected() {
  let (app, _) = app().await;

  let (status, body) =
    send(&app, "POST", "/scan", Some(json!({ "code": "2025-0002", "action": "sideways" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Invalid action.");

  let (status, body) = send(&app, "POST", "/scan", Some(json!({ "code": "  \r\n" }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["error"], "Invalid scan code.");
}

#[tokio::test]
async fn recent_respects_limit() {
  let (app, clock) = app().await;
  for code in ["A", "B", "C"] {
    enroll(&app, code).await;
    send(&app, "POST", "/scan/in", Some(json!({ "code": code }))).await;
    clock.advance(Duration::minutes(1));
  }

  let (_, body) = send(&app, "GET", "/recent", None).await;
  let codes: Vec<_> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|e| e["student"]["scan_code"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(codes, ["C", "B"]);

  let (_, body) = send(&app, "GET", "/recent?limit=10", None).await;
  assert_eq!(body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn student_admin_and_import() {
  let (app, _) = app().await;

  let (status, report) = send(
    &app,
    "POST",
    "/students/import",
    Some(json!([
      { "StudentNumber": "2025-0002", "FirstName": "Maria", "LastName": "Santos", "Year": "2" },
      { "StudentNumber": "2025-0003", "Sex": "?" },
      { "FirstName": "No Number" },
    ])),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["created"], 2);
  assert_eq!(report["rows_failed"].as_array().unwrap().len(), 1);
  assert_eq!(report["field_failures"][0]["column"], "Sex");

  let (status, maria) = send(&app, "GET", "/students/by-code/2025-0002", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(maria["profile"]["last_name"], "Santos");

  let id = maria["student_id"].as_str().unwrap();
  let (status, _) = send(&app, "GET", &format!("/students/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);

  // A partial re-import leaves the stored profile intact.
  let (status, report) = send(
    &app,
    "POST",
    "/students/import",
    Some(json!([{ "StudentNumber": "2025-0002", "Department": "Nursing", "Sex": "x" }])),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["updated"], 1);
  let (_, maria) = send(&app, "GET", "/students/by-code/2025-0002", None).await;
  assert_eq!(maria["profile"]["first_name"], "Maria");
  assert_eq!(maria["profile"]["last_name"], "Santos");
  assert_eq!(maria["profile"]["department"], "Nursing");

  let (status, _) = send(&app, "GET", "/students/by-code/2025-9999", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  // Re-posting an existing scan code updates it.
  let (status, _) = send(
    &app,
    "POST",
    "/students",
    Some(json!({ "scan_code": "2025-0002", "profile": { "department": "Nursing" } })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, all) = send(&app, "GET", "/students", None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);
}
