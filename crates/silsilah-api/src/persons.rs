//! `GET /persons/{id}/ancestors`: the ancestry index of one person.

use axum::{
  Json,
  extract::{Path, State},
};
use silsilah_core::{KinshipEngine, ancestry::Ancestry, store::FamilyStore};
use uuid::Uuid;

use crate::error::ApiError;

pub async fn ancestors<S>(
  State(engine): State<KinshipEngine<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Ancestry>, ApiError>
where
  S: FamilyStore + 'static,
{
  let ancestry = engine.ancestors(id, &engine.context()).await?;
  Ok(Json(ancestry))
}
