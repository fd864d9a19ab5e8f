//! In-memory family graph built from one [`GraphSnapshot`].
//!
//! The graph is immutable once built and is shared read-only between the
//! traversals of a single request.

use std::collections::{BTreeSet, HashMap};

use crate::{
  Error, Result,
  family::{Marriage, MarriageId, ParentChild, Person, PersonId},
  store::{GraphScope, GraphSnapshot},
};

/// A parent->child edge that breaks the generation invariant inside a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationViolation {
  pub parent_id: PersonId,
  pub child_id:  PersonId,
}

#[derive(Debug, Clone)]
pub struct FamilyGraph {
  scope:             GraphScope,
  persons:           HashMap<PersonId, Person>,
  marriages:         HashMap<MarriageId, Marriage>,
  /// Marriages per person, ordered by `(marriage_date, marriage_id)`.
  person_marriages:  HashMap<PersonId, Vec<MarriageId>>,
  /// Links per marriage, ordered by `(birth_order, child_id)`.
  marriage_children: HashMap<MarriageId, Vec<ParentChild>>,
  /// The marriage each child was born into.
  child_marriage:    HashMap<PersonId, MarriageId>,
}

impl FamilyGraph {
  /// Index `snapshot`. Links that reference unloaded marriages are dropped;
  /// a child linked to several marriages keeps the lowest marriage id.
  pub fn build(scope: GraphScope, snapshot: GraphSnapshot) -> Self {
    let persons: HashMap<_, _> = snapshot
      .persons
      .into_iter()
      .map(|p| (p.person_id, p))
      .collect();

    let mut person_marriages: HashMap<PersonId, Vec<MarriageId>> = HashMap::new();
    let mut ordered: Vec<&Marriage> = snapshot.marriages.iter().collect();
    ordered.sort_by_key(|m| (m.marriage_date, m.marriage_id));
    for m in ordered {
      person_marriages.entry(m.husband_id).or_default().push(m.marriage_id);
      if m.wife_id != m.husband_id {
        person_marriages.entry(m.wife_id).or_default().push(m.marriage_id);
      }
    }

    let marriages: HashMap<_, _> = snapshot
      .marriages
      .into_iter()
      .map(|m| (m.marriage_id, m))
      .collect();

    let mut links = snapshot.parent_child_links;
    links.sort_by_key(|l| (l.child_id, l.marriage_id));

    let mut child_marriage = HashMap::new();
    let mut marriage_children: HashMap<MarriageId, Vec<ParentChild>> = HashMap::new();
    for link in links {
      if !marriages.contains_key(&link.marriage_id) {
        tracing::warn!(
          child_id = %link.child_id,
          marriage_id = %link.marriage_id,
          "parent link references a marriage outside the loaded scope; ignored"
        );
        continue;
      }
      if let Some(existing) = child_marriage.get(&link.child_id) {
        tracing::warn!(
          child_id = %link.child_id,
          kept = %existing,
          dropped = %link.marriage_id,
          "child is linked to more than one marriage"
        );
        continue;
      }
      child_marriage.insert(link.child_id, link.marriage_id);
      marriage_children.entry(link.marriage_id).or_default().push(link);
    }
    for children in marriage_children.values_mut() {
      children.sort_by_key(|l| (l.birth_order, l.child_id));
    }

    Self {
      scope,
      persons,
      marriages,
      person_marriages,
      marriage_children,
      child_marriage,
    }
  }

  pub fn scope(&self) -> GraphScope { self.scope }

  pub fn contains(&self, id: PersonId) -> bool { self.persons.contains_key(&id) }

  pub fn person(&self, id: PersonId) -> Result<&Person> {
    self.persons.get(&id).ok_or(Error::PersonNotFound(id))
  }

  pub fn persons(&self) -> impl Iterator<Item = &Person> { self.persons.values() }

  /// Whether `id` is a member of the loaded scope rather than a referenced
  /// outsider.
  pub fn in_scope(&self, id: PersonId) -> bool {
    self.persons.get(&id).is_some_and(|p| self.scope.includes(p))
  }

  // ── Edges ──────────────────────────────────────────────────────────────

  /// The marriage `id` was born into, if recorded.
  pub fn parent_marriage_of(&self, id: PersonId) -> Option<&Marriage> {
    self.child_marriage.get(&id).and_then(|m| self.marriages.get(m))
  }

  /// Husband and wife of the marriage `id` was born into. Empty for branch
  /// roots, external spouses and unknown ids.
  pub fn parents_of(&self, id: PersonId) -> BTreeSet<PersonId> {
    self
      .parent_marriage_of(id)
      .map(|m| [m.husband_id, m.wife_id].into_iter().collect())
      .unwrap_or_default()
  }

  /// Marriages `id` is party to, ordered by date then id.
  pub fn marriages_of(&self, id: PersonId) -> impl Iterator<Item = &Marriage> {
    self
      .person_marriages
      .get(&id)
      .into_iter()
      .flatten()
      .filter_map(|m| self.marriages.get(m))
  }

  /// Links out of `marriage_id`, ordered by birth order then child id.
  pub fn children_of_marriage(&self, marriage_id: MarriageId) -> &[ParentChild] {
    self
      .marriage_children
      .get(&marriage_id)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  /// Children across every marriage `id` is party to.
  pub fn children_of(&self, id: PersonId) -> BTreeSet<PersonId> {
    self
      .marriages_of(id)
      .flat_map(|m| self.children_of_marriage(m.marriage_id))
      .map(|l| l.child_id)
      .collect()
  }

  pub fn spouses_of(&self, id: PersonId) -> BTreeSet<PersonId> {
    self.marriages_of(id).filter_map(|m| m.spouse_of(id)).collect()
  }

  // ── Integrity ──────────────────────────────────────────────────────────

  /// Parent->child edges within one branch where the child's generation is
  /// not greater than the parent's.
  pub fn generation_violations(&self) -> Vec<GenerationViolation> {
    let mut out = Vec::new();
    for (child_id, marriage_id) in &self.child_marriage {
      let (Some(child), Some(m)) =
        (self.persons.get(child_id), self.marriages.get(marriage_id))
      else {
        continue;
      };
      for parent_id in [m.husband_id, m.wife_id] {
        let Some(parent) = self.persons.get(&parent_id) else { continue };
        if parent.branch_id.is_some()
          && parent.branch_id == child.branch_id
          && child.generation <= parent.generation
        {
          out.push(GenerationViolation { parent_id, child_id: *child_id });
        }
      }
    }
    out.sort_by_key(|v| (v.child_id, v.parent_id));
    out
  }
}


#[cfg(test)]
mod tests {
  use super::fixtures::three_generations;

  #[test]
  fn parents_come_from_the_birth_marriage() {
    let t = three_generations();
    let g = t.family.graph();

    let parents = g.parents_of(t.a);
    assert_eq!(parents.len(), 2);
    assert!(parents.contains(&t.h) && parents.contains(&t.w));
    assert!(g.parents_of(t.h).is_empty());
    assert!(g.parents_of(t.s).is_empty());
  }

  #[test]
  fn children_and_spouses_are_derived_from_marriages() {
    let t = three_generations();
    let g = t.family.graph();

    assert_eq!(g.children_of(t.w).len(), 2);
    assert!(g.children_of(t.a).contains(&t.c));
    assert!(g.children_of(t.s).contains(&t.c));
    assert!(g.children_of(t.c).is_empty());
    assert!(g.spouses_of(t.a).contains(&t.s));
    assert!(g.spouses_of(t.b).is_empty());
  }

  #[test]
  fn unknown_person_has_no_edges() {
    let t = three_generations();
    let g = t.family.graph();
    let ghost = uuid::Uuid::new_v4();

    assert!(g.parents_of(ghost).is_empty());
    assert!(g.children_of(ghost).is_empty());
    assert!(g.person(ghost).is_err());
  }

  #[test]
  fn duplicate_parent_link_keeps_one_marriage() {
    let mut t = three_generations();
    let other = t.family.marry(t.b, t.s);
    t.family.child(other, t.c);
    let g = t.family.graph();

    assert_eq!(g.parents_of(t.c).len(), 2);
  }

  #[test]
  fn generation_violation_is_reported_within_a_branch() {
    let mut t = three_generations();
    if let Some(c) = t.family.snapshot.persons.iter_mut().find(|p| p.person_id == t.c) {
      c.generation = 2;
    }
    let g = t.family.graph();

    let violations = g.generation_violations();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].parent_id, t.a);
    assert_eq!(violations[0].child_id, t.c);
  }
}
