//! JSON REST API for the kinship engine.
//!
//! Exposes an axum [`Router`] backed by a [`KinshipEngine`] over any
//! [`silsilah_core::store::FamilyStore`]. Every request gets its own
//! resolve context carrying the configured timeout. Tracing layers and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", silsilah_api::api_router(engine.clone()))
//! ```

pub mod branches;
pub mod error;
pub mod persons;
pub mod relationship;
pub mod tree;

use axum::{
  Router,
  routing::{get, post},
};
use silsilah_core::{KinshipEngine, store::FamilyStore};

pub use error::ApiError;

/// Build a fully-materialised API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: KinshipEngine<S>) -> Router<()>
where
  S: FamilyStore + 'static,
{
  Router::new()
    .route("/relationship/{a}/{b}", get(relationship::get_one::<S>))
    .route("/relationships", post(relationship::batch::<S>))
    .route("/tree", get(tree::handler::<S>))
    .route("/branches", get(branches::list::<S>))
    .route("/persons/{id}/ancestors", get(persons::ancestors::<S>))
    .with_state(engine)
}

// ─── Integration tests ───────────────────────────────────────────────────────
