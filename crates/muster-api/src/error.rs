//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use muster_core::error::STORE_UNAVAILABLE_MESSAGE;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<muster_core::Error> for ApiError {
  fn from(err: muster_core::Error) -> Self {
    use muster_core::Error as E;

    let message = err.user_message().to_owned();
    match err {
      E::InvalidScanCode(_) | E::InvalidAction(_) => ApiError::BadRequest(message),
      E::ConcurrentModification(_) => ApiError::Conflict(message),
      E::StoreUnavailable(source) => ApiError::Store(source),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store unavailable");
        (StatusCode::SERVICE_UNAVAILABLE, STORE_UNAVAILABLE_MESSAGE.to_owned())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
