//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The relationship exists in the data but cannot be named.
  #[error("unknown relationship: {0}")]
  Unknown(String),

  #[error("request cancelled")]
  Cancelled,

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<silsilah_core::Error> for ApiError {
  fn from(e: silsilah_core::Error) -> Self {
    use silsilah_core::Error as E;
    match e {
      E::PersonNotFound(_) | E::BranchNotFound(_) | E::MarriageNotFound(_) => {
        Self::NotFound(e.to_string())
      }
      E::UnknownRelationship(cause) => Self::Unknown(cause.to_string()),
      E::Cyclic { .. } => Self::Unknown(e.to_string()),
      E::Cancelled => Self::Cancelled,
      other => Self::Internal(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unknown(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::Cancelled => (StatusCode::REQUEST_TIMEOUT, self.to_string()),
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
