//! Error types for `silsilah-core`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Why a relationship could not be named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnknownCause {
  /// The distance pair is outside the configured label table.
  Unmapped { distance_a: u32, distance_b: u32 },
  /// The ancestry walk tripped the depth guard on malformed data.
  CyclicData { person_id: Uuid },
}

impl fmt::Display for UnknownCause {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Unmapped { distance_a, distance_b } => {
        write!(f, "no label configured for distance pair ({distance_a}, {distance_b})")
      }
      Self::CyclicData { person_id } => {
        write!(f, "ancestry of {person_id} is cyclic")
      }
    }
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("branch not found: {0}")]
  BranchNotFound(Uuid),

  #[error("marriage not found: {0}")]
  MarriageNotFound(Uuid),

  /// The ancestry walk from `person_id` did not reach a root within
  /// `max_depth` parent hops. A valid family graph is acyclic.
  #[error("parent/child data around {person_id} is cyclic (no root within {max_depth} generations)")]
  Cyclic { person_id: Uuid, max_depth: u32 },

  #[error("unknown relationship: {0}")]
  UnknownRelationship(UnknownCause),

  #[error("resolution cancelled")]
  Cancelled,

  #[error("worker failed: {0}")]
  Worker(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from a [`FamilyStore`](crate::store::FamilyStore)
  /// implementation.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn unmapped(distance_a: u32, distance_b: u32) -> Self {
    Self::UnknownRelationship(UnknownCause::Unmapped { distance_a, distance_b })
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::PersonNotFound(_) | Self::BranchNotFound(_) | Self::MarriageNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
