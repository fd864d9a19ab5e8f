//! Async HTTP client wrapping the silsilah JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use silsilah_core::{
  RelationshipResult, family::Branch, layout::FamilyTree,
  relationship::RelationshipInfo,
};
use uuid::Uuid;

/// Wire view of `GET /api/persons/{id}/ancestors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AncestorList {
  pub person_id: Uuid,
  pub entries:   Vec<AncestorRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AncestorRow {
  pub ancestor_id: Uuid,
  pub distance:    u32,
  pub via:         Uuid,
}

/// Async HTTP client for the silsilah JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client:   Client,
  base_url: String,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  /// Send `req` and decode the body, surfacing the server's `error` message
  /// on failure.
  async fn fetch<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    let resp = req.send().await.with_context(|| format!("{what} failed"))?;
    let status = resp.status();
    tracing::debug!(request = what, %status, "api response");
    if !status.is_success() {
      let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_owned))
        .unwrap_or_default();
      return Err(anyhow!("{what} → {status}: {message}"));
    }
    resp.json().await.with_context(|| format!("deserialising {what}"))
  }

  /// `GET /api/relationship/{a}/{b}`
  pub async fn relationship(&self, a: Uuid, b: Uuid) -> Result<RelationshipInfo> {
    let req = self.client.get(self.url(&format!("/relationship/{a}/{b}")));
    self.fetch("GET /relationship", req).await
  }

  /// `POST /api/relationships`
  pub async fn relationships(
    &self,
    person_id: Uuid,
    targets: &[Uuid],
  ) -> Result<Vec<RelationshipResult>> {
    let req = self
      .client
      .post(self.url("/relationships"))
      .json(&json!({ "person_id": person_id, "targets": targets }));
    self.fetch("POST /relationships", req).await
  }

  /// `GET /api/tree[?branch_id=..&relative_to=..]`
  pub async fn tree(
    &self,
    branch_id: Option<Uuid>,
    relative_to: Option<Uuid>,
  ) -> Result<FamilyTree> {
    let mut query = Vec::new();
    if let Some(id) = branch_id {
      query.push(("branch_id", id.to_string()));
    }
    if let Some(id) = relative_to {
      query.push(("relative_to", id.to_string()));
    }
    let req = self.client.get(self.url("/tree")).query(&query);
    self.fetch("GET /tree", req).await
  }

  /// `GET /api/branches`
  pub async fn branches(&self) -> Result<Vec<Branch>> {
    self.fetch("GET /branches", self.client.get(self.url("/branches"))).await
  }

  /// `GET /api/persons/{id}/ancestors`
  pub async fn ancestors(&self, id: Uuid) -> Result<AncestorList> {
    let req = self.client.get(self.url(&format!("/persons/{id}/ancestors")));
    self.fetch("GET /persons/ancestors", req).await
  }
}
