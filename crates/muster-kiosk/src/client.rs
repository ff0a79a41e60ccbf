//! Async HTTP client wrapping the muster scan API.

use anyhow::{Context, Result, anyhow};
use muster_core::{attendance::ActivityEntry, scan::ScanOutcome};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::app::Station;

/// Async HTTP client for the muster JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

/// Error body returned by the server for 4xx/5xx responses.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(10))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// `POST /api/scan`
  pub async fn scan(&self, code: &str, station: Station) -> Result<ScanOutcome> {
    let body = match station.action() {
      Some(action) => json!({ "code": code, "action": action }),
      None => json!({ "code": code }),
    };
    let resp = self
      .client
      .post(self.url("/scan"))
      .json(&body)
      .send()
      .await
      .context("POST /scan failed")?;

    let resp = check(resp, "POST /scan").await?;
    resp.json().await.context("deserialising scan outcome")
  }

  /// `GET /api/recent`
  pub async fn recent(&self) -> Result<Vec<ActivityEntry>> {
    let resp = self
      .client
      .get(self.url("/recent"))
      .send()
      .await
      .context("GET /recent failed")?;

    let resp = check(resp, "GET /recent").await?;
    resp.json().await.context("deserialising recent activity")
  }
}

/// Turn a non-success response into an error carrying the server's message.
async fn check(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  match resp.json::<ErrorBody>().await {
    Ok(body) => Err(anyhow!(body.error)),
    Err(_) => Err(anyhow!("{what} → {status}")),
  }
}
