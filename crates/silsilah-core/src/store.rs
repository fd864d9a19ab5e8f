//! The `FamilyStore` trait and the graph scope it loads.
//!
//! The trait is implemented by storage backends (e.g. `silsilah-store-sqlite`).
//! The engine and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::family::{Branch, BranchId, Marriage, ParentChild, Person, PersonId};

// ─── Scope ───────────────────────────────────────────────────────────────────

/// Which part of the family graph to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "branch_id", rename_all = "snake_case")]
pub enum GraphScope {
  All,
  Branch(BranchId),
}

impl GraphScope {
  pub fn from_branch(branch_id: Option<BranchId>) -> Self {
    branch_id.map_or(Self::All, Self::Branch)
  }

  pub fn branch_id(&self) -> Option<BranchId> {
    match self {
      Self::All => None,
      Self::Branch(id) => Some(*id),
    }
  }

  /// Whether `person` is a member of this scope (as opposed to a referenced
  /// outsider loaded only so the scope's edges resolve).
  pub fn includes(&self, person: &Person) -> bool {
    match self {
      Self::All => true,
      Self::Branch(id) => person.branch_id == Some(*id),
    }
  }
}

/// The raw records for one scope, as returned by
/// [`FamilyStore::load_graph_scope`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
  pub persons:            Vec<Person>,
  pub marriages:          Vec<Marriage>,
  pub parent_child_links: Vec<ParentChild>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read access to persisted family records.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Backend errors
/// must convert into [`crate::Error`] so that not-found conditions survive
/// the trip through the engine.
pub trait FamilyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  /// Load every record needed to build a graph for `scope`.
  ///
  /// For [`GraphScope::Branch`] this is the branch members, every marriage a
  /// member is party to or was born into, the links of those marriages, and
  /// every person those marriages and links reference. Fails with a
  /// not-found error if the branch does not exist.
  fn load_graph_scope(
    &self,
    scope: GraphScope,
  ) -> impl Future<Output = Result<GraphSnapshot, Self::Error>> + Send + '_;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Retrieve a branch by id. Returns `None` if not found.
  fn get_branch(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Branch>, Self::Error>> + Send + '_;

  /// List all branches with their aggregate counts.
  fn list_branches(
    &self,
  ) -> impl Future<Output = Result<Vec<Branch>, Self::Error>> + Send + '_;
}
