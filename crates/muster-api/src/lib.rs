//! JSON REST API for Muster.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`Directory`] and [`AttendanceStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", muster_api::api_router(recorder.clone()))
//! ```

pub mod attendance;
pub mod error;
pub mod scan;
pub mod students;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use muster_core::{
  recorder::Recorder,
  store::{AttendanceStore, Directory},
};

pub use error::ApiError;

/// Shared handler state: the recorder, which also owns the store handles.
pub type SharedRecorder<S> = Arc<Recorder<S, S>>;

/// Build a fully-materialised API router for `recorder`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(recorder: SharedRecorder<S>) -> Router<()>
where
  S: Directory + AttendanceStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Scan stations
    .route("/scan", post(scan::submit::<S>))
    .route("/scan/in", post(scan::submit_in::<S>))
    .route("/scan/out", post(scan::submit_out::<S>))
    .route("/recent", get(scan::recent::<S>))
    // Back office
    .route("/attendance", get(attendance::list::<S>))
    .route("/students", get(students::list::<S>).post(students::create::<S>))
    .route("/students/import", post(students::import::<S>))
    .route("/students/by-code/{code}", get(students::by_code::<S>))
    .route("/students/{id}", get(students::get_one::<S>))
    .with_state(recorder)
}

#[cfg(test)]
mod tests;
