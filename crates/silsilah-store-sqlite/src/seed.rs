//! JSON seed documents for bulk-loading a family graph.

use serde::{Deserialize, Serialize};
use silsilah_core::family::{MarriageId, NewBranch, NewMarriage, NewPerson, PersonId};

/// A whole family in one document. Records reference each other by id, so
/// every person and marriage that is referenced must carry an explicit id.
///
/// Records are inserted in field order: branches, persons, marriages,
/// children. Branch roots may name persons defined later in the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilySeed {
  pub branches:  Vec<NewBranch>,
  pub persons:   Vec<NewPerson>,
  pub marriages: Vec<NewMarriage>,
  pub children:  Vec<SeedChild>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedChild {
  pub marriage_id: MarriageId,
  pub child_id:    PersonId,
  /// Next free position within the marriage when absent.
  #[serde(default)]
  pub birth_order: Option<u32>,
}

/// Row counts written by [`crate::SqliteStore::import`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
  pub branches:  usize,
  pub persons:   usize,
  pub marriages: usize,
  pub children:  usize,
}

impl FamilySeed {
  pub fn from_json(s: &str) -> serde_json::Result<Self> { serde_json::from_str(s) }
}
