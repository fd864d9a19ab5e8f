//! Ancestry index: every ancestor of a person with its generation distance.
//!
//! The walk is breadth-first, one generation per level. Each level is the set
//! of people reachable by exactly that many parent hops, so in an acyclic
//! graph the frontier empties once the oldest recorded ancestor is passed.
//! Cyclic data never empties it, which is what the depth bound catches.
//!
//! Nothing is cached between calls; rebuild the graph and call again to see
//! new data.

use std::{
  collections::{BTreeMap, BTreeSet, HashMap},
  sync::Arc,
};

use serde::Serialize;
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
  Error, Result,
  context::ResolveContext,
  family::PersonId,
  graph::FamilyGraph,
};

/// One ancestor reached at its minimum distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AncestorEntry {
  pub ancestor_id: PersonId,
  /// Parent hops from the indexed person.
  pub distance:    u32,
  /// The descendant one hop closer to the indexed person on a
  /// minimum-distance path.
  pub via:         PersonId,
}

/// All ancestors of `person_id`, ordered by distance then id. The person
/// itself is not an entry but answers [`Ancestry::distance_to`] with 0.
#[derive(Debug, Clone, Serialize)]
pub struct Ancestry {
  pub person_id: PersonId,
  pub entries:   Vec<AncestorEntry>,
  #[serde(skip)]
  index:         HashMap<PersonId, usize>,
}

impl Ancestry {
  fn new(person_id: PersonId, entries: Vec<AncestorEntry>) -> Self {
    let index = entries
      .iter()
      .enumerate()
      .map(|(i, e)| (e.ancestor_id, i))
      .collect();
    Self { person_id, entries, index }
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  pub fn entry(&self, ancestor_id: PersonId) -> Option<&AncestorEntry> {
    self.index.get(&ancestor_id).map(|&i| &self.entries[i])
  }

  /// Minimum parent hops to `ancestor_id`; `Some(0)` for the person itself.
  pub fn distance_to(&self, ancestor_id: PersonId) -> Option<u32> {
    if ancestor_id == self.person_id {
      return Some(0);
    }
    self.entry(ancestor_id).map(|e| e.distance)
  }

  /// The person and every ancestor as `(id, distance)`, self first.
  pub fn with_self(&self) -> impl Iterator<Item = (PersonId, u32)> + '_ {
    std::iter::once((self.person_id, 0))
      .chain(self.entries.iter().map(|e| (e.ancestor_id, e.distance)))
  }

  /// The person on the path to `ancestor_id` who is that ancestor's child.
  /// `None` when `ancestor_id` is the person itself or not an ancestor.
  pub fn child_toward(&self, ancestor_id: PersonId) -> Option<PersonId> {
    self.entry(ancestor_id).map(|e| e.via)
  }

  /// Ids from the person up to `ancestor_id`, both inclusive.
  pub fn path_to(&self, ancestor_id: PersonId) -> Option<Vec<PersonId>> {
    if ancestor_id == self.person_id {
      return Some(vec![ancestor_id]);
    }
    let mut path = vec![ancestor_id];
    let mut current = self.entry(ancestor_id)?;
    loop {
      path.push(current.via);
      if current.via == self.person_id {
        break;
      }
      current = self.entry(current.via)?;
    }
    path.reverse();
    Some(path)
  }
}

/// Walk the parents of `person_id` up to the roots of `graph`.
///
/// Fails with [`Error::PersonNotFound`] for unknown ids, [`Error::Cyclic`]
/// when the walk returns to the start or is still going after
/// `ctx.max_depth` generations, and [`Error::Cancelled`] when the context is
/// cancelled between generations.
pub fn ancestors_of(
  graph: &FamilyGraph,
  person_id: PersonId,
  ctx: &ResolveContext,
) -> Result<Ancestry> {
  graph.person(person_id)?;

  let mut entries: Vec<AncestorEntry> = Vec::new();
  let mut seen: BTreeSet<PersonId> = BTreeSet::new();
  let mut frontier: BTreeSet<PersonId> = BTreeSet::from([person_id]);
  let mut depth = 0u32;

  loop {
    ctx.checkpoint()?;

    // parent -> lowest-id child in the frontier that reaches it
    let mut next: BTreeMap<PersonId, PersonId> = BTreeMap::new();
    for &child in &frontier {
      for parent in graph.parents_of(child) {
        next.entry(parent).or_insert(child);
      }
    }
    if next.is_empty() {
      break;
    }
    if next.contains_key(&person_id) || depth >= ctx.max_depth {
      return Err(Error::Cyclic { person_id, max_depth: ctx.max_depth });
    }

    depth += 1;
    for (&ancestor_id, &via) in &next {
      if seen.insert(ancestor_id) {
        entries.push(AncestorEntry { ancestor_id, distance: depth, via });
      }
    }
    frontier = next.into_keys().collect();
  }

  Ok(Ancestry::new(person_id, entries))
}

/// Compute ancestries for many people on at most `max_workers` blocking
/// threads. Results keep the order of `ids`.
pub async fn ancestries_bulk(
  graph: Arc<FamilyGraph>,
  ids: Vec<PersonId>,
  ctx: ResolveContext,
  max_workers: usize,
) -> Vec<Result<Ancestry>> {
  let semaphore = Arc::new(Semaphore::new(max_workers.max(1)));
  let mut set = JoinSet::new();
  let count = ids.len();

  for (idx, id) in ids.into_iter().enumerate() {
    let graph = Arc::clone(&graph);
    let ctx = ctx.clone();
    let semaphore = Arc::clone(&semaphore);
    set.spawn(async move {
      let result = match semaphore.acquire_owned().await {
        Ok(_permit) => {
          tokio::task::spawn_blocking(move || ancestors_of(&graph, id, &ctx))
            .await
            .unwrap_or_else(|e| Err(Error::Worker(e.to_string())))
        }
        Err(_) => Err(Error::Cancelled),
      };
      (idx, result)
    });
  }

  let mut slots: Vec<Option<Result<Ancestry>>> = (0..count).map(|_| None).collect();
  while let Some(joined) = set.join_next().await {
    match joined {
      Ok((idx, result)) => slots[idx] = Some(result),
      Err(e) => tracing::error!(error = %e, "ancestry worker task failed"),
    }
  }

  slots
    .into_iter()
    .map(|slot| {
      slot.unwrap_or_else(|| Err(Error::Worker("ancestry task did not complete".into())))
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    context::CancelToken,
    family::Gender,
    graph::fixtures::{FamilyBuilder, three_generations},
  };

  #[test]
  fn ancestors_are_ordered_by_distance() {
    let t = three_generations();
    let g = t.family.graph();

    let anc = ancestors_of(&g, t.c, &ResolveContext::default()).unwrap();
    let distances: Vec<u32> = anc.entries.iter().map(|e| e.distance).collect();
    assert_eq!(distances, vec![1, 1, 2, 2]);
    assert_eq!(anc.distance_to(t.c), Some(0));
    assert_eq!(anc.distance_to(t.a), Some(1));
    assert_eq!(anc.distance_to(t.s), Some(1));
    assert_eq!(anc.distance_to(t.h), Some(2));
    assert_eq!(anc.distance_to(t.b), None);
  }

  #[test]
  fn root_has_no_ancestors() {
    let t = three_generations();
    let g = t.family.graph();

    let anc = ancestors_of(&g, t.h, &ResolveContext::default()).unwrap();
    assert!(anc.is_empty());
  }

  #[test]
  fn unknown_person_is_not_found() {
    let t = three_generations();
    let g = t.family.graph();

    let err = ancestors_of(&g, uuid::Uuid::new_v4(), &ResolveContext::default())
      .unwrap_err();
    assert!(matches!(err, Error::PersonNotFound(_)));
  }

  #[test]
  fn path_runs_from_person_to_ancestor() {
    let t = three_generations();
    let g = t.family.graph();

    let anc = ancestors_of(&g, t.c, &ResolveContext::default()).unwrap();
    assert_eq!(anc.path_to(t.h), Some(vec![t.c, t.a, t.h]));
    assert_eq!(anc.child_toward(t.h), Some(t.a));
    assert_eq!(anc.path_to(t.c), Some(vec![t.c]));
  }

  #[test]
  fn pedigree_collapse_keeps_minimum_distance() {
    // G is both grandparent (via P) and great-grandparent (via Q, R) of X.
    let mut f = FamilyBuilder::default();
    let g = f.person("G", Gender::Male, 1, None);
    let gw = f.person("GW", Gender::Female, 1, None);
    let p = f.person("P", Gender::Male, 2, None);
    let r = f.person("R", Gender::Male, 2, None);
    let rw = f.person("RW", Gender::Female, 2, None);
    let q = f.person("Q", Gender::Female, 3, None);
    let x = f.person("X", Gender::Male, 4, None);

    let m_g = f.marry(g, gw);
    f.child(m_g, p);
    f.child(m_g, r);
    let m_r = f.marry(r, rw);
    f.child(m_r, q);
    let m_pq = f.marry(p, q);
    f.child(m_pq, x);

    let graph = f.graph();
    let anc = ancestors_of(&graph, x, &ResolveContext::default()).unwrap();

    assert_eq!(anc.distance_to(g), Some(2));
    let ids: BTreeSet<_> = anc.entries.iter().map(|e| e.ancestor_id).collect();
    assert_eq!(ids.len(), anc.len(), "an ancestor was listed twice");
  }

  #[test]
  fn cyclic_data_terminates_with_cyclic() {
    // A is B's parent and B is A's parent.
    let mut f = FamilyBuilder::default();
    let a = f.person("A", Gender::Male, 1, None);
    let aw = f.person("AW", Gender::Female, 1, None);
    let b = f.person("B", Gender::Male, 2, None);
    let bw = f.person("BW", Gender::Female, 2, None);
    let m_a = f.marry(a, aw);
    f.child(m_a, b);
    let m_b = f.marry(b, bw);
    f.child(m_b, a);

    let graph = f.graph();
    let err = ancestors_of(&graph, a, &ResolveContext::default()).unwrap_err();
    assert!(matches!(err, Error::Cyclic { person_id, .. } if person_id == a));
  }

  #[test]
  fn cycle_above_the_start_hits_the_depth_bound() {
    // X's parents sit on a two-person loop that never includes X.
    let mut f = FamilyBuilder::default();
    let x = f.person("X", Gender::Male, 3, None);
    let a = f.person("A", Gender::Male, 2, None);
    let aw = f.person("AW", Gender::Female, 2, None);
    let b = f.person("B", Gender::Male, 1, None);
    let bw = f.person("BW", Gender::Female, 1, None);
    let m_a = f.marry(a, aw);
    f.child(m_a, x);
    let m_b = f.marry(b, bw);
    f.child(m_b, a);
    f.child(m_a, b);

    let graph = f.graph();
    let ctx = ResolveContext::new(16, CancelToken::new());
    let err = ancestors_of(&graph, x, &ctx).unwrap_err();
    assert!(matches!(err, Error::Cyclic { max_depth: 16, .. }));
  }

  #[test]
  fn cancelled_context_stops_the_walk() {
    let t = three_generations();
    let g = t.family.graph();
    let token = CancelToken::new();
    token.cancel();

    let err = ancestors_of(&g, t.c, &ResolveContext::new(8, token)).unwrap_err();
    assert!(matches!(err, Error::Cancelled));
  }

  #[tokio::test]
  async fn bulk_preserves_input_order() {
    let t = three_generations();
    let g = Arc::new(t.family.graph());
    let ids = vec![t.c, t.h, t.b, t.a];

    let results =
      ancestries_bulk(g, ids.clone(), ResolveContext::default(), 2).await;
    let got: Vec<PersonId> = results
      .into_iter()
      .map(|r| r.unwrap().person_id)
      .collect();
    assert_eq!(got, ids);
  }
}
