//! Kinship resolution for Javanese family trees (silsilah).
//!
//! This crate holds the domain types, the [`store::FamilyStore`] trait and
//! every resolver: ancestry index, lowest common ancestor, relationship
//! labels and tree layout. It is free of HTTP and database dependencies.

pub mod ancestry;
pub mod context;
pub mod engine;
pub mod error;
pub mod family;
pub mod graph;
pub mod label;
pub mod layout;
pub mod lca;
pub mod relationship;
pub mod store;

pub use engine::{EngineConfig, KinshipEngine, RelationshipResult};
pub use error::{Error, Result, UnknownCause};
