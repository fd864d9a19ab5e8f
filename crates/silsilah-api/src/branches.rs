//! `GET /branches`: every branch with its aggregate counts.

use axum::{Json, extract::State};
use silsilah_core::{KinshipEngine, family::Branch, store::FamilyStore};

use crate::error::ApiError;

pub async fn list<S>(
  State(engine): State<KinshipEngine<S>>,
) -> Result<Json<Vec<Branch>>, ApiError>
where
  S: FamilyStore + 'static,
{
  let branches = engine.branches().await?;
  Ok(Json(branches))
}
