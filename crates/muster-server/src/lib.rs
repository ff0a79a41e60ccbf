//! HTTP server wiring for Muster: configuration and the top-level router.

use std::{path::{Path, PathBuf}, sync::Arc};

use axum::{Router, routing::get};
use chrono::FixedOffset;
use config::{Config, ConfigBuilder, ConfigError, builder::DefaultState};
use muster_core::{
  recorder::{DEFAULT_RECENT_LIMIT, Recorder},
  store::{AttendanceStore, Directory},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MUSTER_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  #[serde(default = "default_store_path")]
  pub store_path:   PathBuf,
  /// Offset of the school's local time, e.g. `+08:00`. Decides which
  /// calendar day a scan belongs to.
  #[serde(default = "default_utc_offset")]
  pub utc_offset:   String,
  /// Size of the recent-activity feed returned with each scan.
  #[serde(default = "default_recent_limit")]
  pub recent_limit: usize,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("muster.db") }

fn default_utc_offset() -> String { "+00:00".into() }

fn default_recent_limit() -> usize { DEFAULT_RECENT_LIMIT }

impl ServerConfig {
  /// Layer the TOML file at `path` (optional) under the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_builder(
      Config::builder().add_source(config::File::from(path).required(false)),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
    builder
      .add_source(config::Environment::with_prefix("MUSTER"))
      .build()?
      .try_deserialize()
  }

  pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
    self
      .utc_offset
      .parse()
      .map_err(|e| ConfigError::Message(format!("invalid utc_offset {:?}: {e}", self.utc_offset)))
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the JSON API under `/api` plus a liveness probe.
pub fn router<S>(recorder: Arc<Recorder<S, S>>) -> Router
where
  S: Directory + AttendanceStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", muster_api::api_router(recorder))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::{Request, StatusCode}};
  use config::FileFormat;
  use muster_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  fn from_toml(toml: &str) -> Result<ServerConfig, ConfigError> {
    ServerConfig::from_builder(
      Config::builder().add_source(config::File::from_str(toml, FileFormat::Toml)),
    )
  }

  #[test]
  fn defaults_apply_to_empty_config() {
    let cfg = from_toml("").unwrap();
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.recent_limit, 2);
    assert_eq!(cfg.utc_offset().unwrap().local_minus_utc(), 0);
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = from_toml(
      r#"
        host = "0.0.0.0"
        port = 9000
        store_path = "/var/lib/muster/muster.db"
        utc_offset = "+08:00"
        recent_limit = 4
      "#,
    )
    .unwrap();
    assert_eq!(cfg.address(), "0.0.0.0:9000");
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/muster/muster.db"));
    assert_eq!(cfg.utc_offset().unwrap().local_minus_utc(), 8 * 3600);
    assert_eq!(cfg.recent_limit, 4);
  }

  #[test]
  fn bad_offset_is_reported() {
    let cfg = from_toml(r#"utc_offset = "Asia/Manila""#).unwrap();
    assert!(cfg.utc_offset().is_err());
  }

  #[tokio::test]
  async fn health_and_api_are_mounted() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = router(Arc::new(Recorder::new(store.clone(), store)));

    let res = app
      .clone()
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
      .oneshot(Request::get("/api/recent").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
  }
}
