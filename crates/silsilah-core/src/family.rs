//! Persisted family records: people, branches, marriages and parent-child
//! links.
//!
//! These are read-only snapshots as far as the engine is concerned. Writes go
//! through the storage backend.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PersonId = Uuid;
pub type BranchId = Uuid;
pub type MarriageId = Uuid;

// ─── Person ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
}

/// A member of the family, or an external spouse married into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
  pub person_id:   PersonId,
  pub full_name:   String,
  pub nickname:    Option<String>,
  pub gender:      Gender,
  pub is_alive:    bool,
  /// Depth from the root of the person's branch; the root is generation 1.
  pub generation:  i32,
  pub birth_order: Option<u32>,
  /// `None` for external spouses, who belong to no lineage branch.
  pub branch_id:   Option<BranchId>,
  pub photo_url:   Option<String>,
  pub birth_date:  Option<NaiveDate>,
  pub death_date:  Option<NaiveDate>,
  pub created_at:  DateTime<Utc>,
}

impl Person {
  pub fn is_external_spouse(&self) -> bool { self.branch_id.is_none() }

  /// The short name used in paths and tree nodes.
  pub fn display_name(&self) -> &str {
    self.nickname.as_deref().unwrap_or(&self.full_name)
  }
}

/// Input to [`crate::store::FamilyStore`] backends when adding a person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPerson {
  /// Caller-supplied id; the backend generates one when `None`.
  #[serde(default)]
  pub person_id:   Option<PersonId>,
  pub full_name:   String,
  #[serde(default)]
  pub nickname:    Option<String>,
  pub gender:      Gender,
  #[serde(default = "default_alive")]
  pub is_alive:    bool,
  pub generation:  i32,
  #[serde(default)]
  pub birth_order: Option<u32>,
  #[serde(default)]
  pub branch_id:   Option<BranchId>,
  #[serde(default)]
  pub photo_url:   Option<String>,
  #[serde(default)]
  pub birth_date:  Option<NaiveDate>,
  #[serde(default)]
  pub death_date:  Option<NaiveDate>,
}

fn default_alive() -> bool { true }

impl NewPerson {
  /// Convenience constructor with all optional fields unset.
  pub fn new(full_name: impl Into<String>, gender: Gender, generation: i32) -> Self {
    Self {
      person_id: None,
      full_name: full_name.into(),
      nickname: None,
      gender,
      is_alive: true,
      generation,
      birth_order: None,
      branch_id: None,
      photo_url: None,
      birth_date: None,
      death_date: None,
    }
  }

  pub fn in_branch(mut self, branch_id: BranchId) -> Self {
    self.branch_id = Some(branch_id);
    self
  }

  pub fn birth_order(mut self, order: u32) -> Self {
    self.birth_order = Some(order);
    self
  }
}

// ─── Branch ──────────────────────────────────────────────────────────────────

/// A tracked lineage rooted at one ancestor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
  pub branch_id:      BranchId,
  pub name:           String,
  pub root_person_id: Option<PersonId>,
  /// Members of the branch (people whose `branch_id` points here).
  pub person_count:   u32,
  pub living_count:   u32,
  /// Distinct external spouses married to members of the branch.
  pub spouse_count:   u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBranch {
  #[serde(default)]
  pub branch_id:      Option<BranchId>,
  pub name:           String,
  #[serde(default)]
  pub root_person_id: Option<PersonId>,
}

// ─── Marriage ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marriage {
  pub marriage_id:   MarriageId,
  pub husband_id:    PersonId,
  pub wife_id:       PersonId,
  pub marriage_date: Option<NaiveDate>,
  pub divorce_date:  Option<NaiveDate>,
  /// Both spouses are members of some tracked branch.
  pub is_internal:   bool,
  /// `false` once `divorce_date` is set.
  pub is_active:     bool,
}

impl Marriage {
  pub fn involves(&self, person_id: PersonId) -> bool {
    self.husband_id == person_id || self.wife_id == person_id
  }

  /// The other party of the marriage, if `person_id` is one of the spouses.
  pub fn spouse_of(&self, person_id: PersonId) -> Option<PersonId> {
    if self.husband_id == person_id {
      Some(self.wife_id)
    } else if self.wife_id == person_id {
      Some(self.husband_id)
    } else {
      None
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMarriage {
  #[serde(default)]
  pub marriage_id:   Option<MarriageId>,
  pub husband_id:    PersonId,
  pub wife_id:       PersonId,
  #[serde(default)]
  pub marriage_date: Option<NaiveDate>,
  #[serde(default)]
  pub divorce_date:  Option<NaiveDate>,
}

impl NewMarriage {
  pub fn new(husband_id: PersonId, wife_id: PersonId) -> Self {
    Self {
      marriage_id: None,
      husband_id,
      wife_id,
      marriage_date: None,
      divorce_date: None,
    }
  }
}

// ─── ParentChild ─────────────────────────────────────────────────────────────

/// Links a child to the marriage of its parents. `birth_order` is unique
/// within the marriage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentChild {
  pub marriage_id: MarriageId,
  pub child_id:    PersonId,
  pub birth_order: u32,
}
