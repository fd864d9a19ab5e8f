//! Handlers for relationship endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/relationship/{a}/{b}` | What `b` is to `a`; 422 if unnamed |
//! | `POST` | `/relationships` | Body: `{"person_id":..,"targets":[..]}` |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Deserialize;
use silsilah_core::{
  KinshipEngine, RelationshipResult, relationship::RelationshipInfo, store::FamilyStore,
};
use uuid::Uuid;

use crate::error::ApiError;

/// Largest batch accepted by `POST /relationships`.
pub const MAX_TARGETS: usize = 500;

// ─── Single ──────────────────────────────────────────────────────────────────

/// `GET /relationship/{a}/{b}`
pub async fn get_one<S>(
  State(engine): State<KinshipEngine<S>>,
  Path((a, b)): Path<(Uuid, Uuid)>,
) -> Result<Json<RelationshipInfo>, ApiError>
where
  S: FamilyStore + 'static,
{
  let info = engine.relationship(a, b, &engine.context()).await?;
  Ok(Json(info))
}

// ─── Batch ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BatchBody {
  pub person_id: Uuid,
  pub targets:   Vec<Uuid>,
}

/// `POST /relationships`
pub async fn batch<S>(
  State(engine): State<KinshipEngine<S>>,
  Json(body): Json<BatchBody>,
) -> Result<Json<Vec<RelationshipResult>>, ApiError>
where
  S: FamilyStore + 'static,
{
  if body.targets.len() > MAX_TARGETS {
    return Err(ApiError::BadRequest(format!(
      "at most {MAX_TARGETS} targets per request, got {}",
      body.targets.len()
    )));
  }
  let results = engine
    .relationships_from(body.person_id, body.targets, &engine.context())
    .await?;
  Ok(Json(results))
}
