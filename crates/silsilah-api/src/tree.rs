//! `GET /tree[?branch_id=<uuid>&relative_to=<uuid>]`

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use silsilah_core::{KinshipEngine, layout::FamilyTree, store::FamilyStore};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct TreeParams {
  /// Lay out one branch; the whole graph when absent.
  pub branch_id:   Option<Uuid>,
  /// Label every person relative to this one.
  pub relative_to: Option<Uuid>,
}

pub async fn handler<S>(
  State(engine): State<KinshipEngine<S>>,
  Query(params): Query<TreeParams>,
) -> Result<Json<FamilyTree>, ApiError>
where
  S: FamilyStore + 'static,
{
  let tree = engine
    .tree(params.branch_id, params.relative_to, &engine.context())
    .await?;
  Ok(Json(tree))
}
