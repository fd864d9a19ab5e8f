//! Error type for `silsilah-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] silsilah_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("parse error: {0}")]
  Parse(String),

  #[error("branch not found: {0}")]
  BranchNotFound(Uuid),

  #[error("person not found: {0}")]
  PersonNotFound(Uuid),

  #[error("marriage not found: {0}")]
  MarriageNotFound(Uuid),

  /// A person cannot be recorded as their own spouse or child.
  #[error("invalid link: {0}")]
  InvalidLink(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for silsilah_core::Error {
  fn from(e: Error) -> Self {
    match e {
      Error::Core(inner) => inner,
      Error::BranchNotFound(id) => Self::BranchNotFound(id),
      Error::PersonNotFound(id) => Self::PersonNotFound(id),
      Error::MarriageNotFound(id) => Self::MarriageNotFound(id),
      other => Self::store(other),
    }
  }
}
