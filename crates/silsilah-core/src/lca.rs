//! Lowest-common-ancestor search between two people.

use serde::Serialize;

use crate::{
  Result,
  ancestry::{Ancestry, ancestors_of},
  context::ResolveContext,
  family::PersonId,
  graph::FamilyGraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LcaOutcome {
  /// Both arguments name the same person.
  SamePerson,
  Common {
    lca_id:     PersonId,
    /// Parent hops from the first person to `lca_id`.
    distance_a: u32,
    /// Parent hops from the second person to `lca_id`.
    distance_b: u32,
  },
  NoCommonAncestor,
}

/// Find the nearest common ancestor of `a` and `b` in `graph`.
///
/// Each person counts as their own ancestor at distance 0, so a direct
/// ancestor is found as the LCA of itself and its descendant.
pub fn resolve(
  graph: &FamilyGraph,
  a: PersonId,
  b: PersonId,
  ctx: &ResolveContext,
) -> Result<LcaOutcome> {
  if a == b {
    graph.person(a)?;
    return Ok(LcaOutcome::SamePerson);
  }
  let ancestry_a = ancestors_of(graph, a, ctx)?;
  let ancestry_b = ancestors_of(graph, b, ctx)?;
  Ok(resolve_with(&ancestry_a, &ancestry_b))
}

/// Resolve from two precomputed ancestries.
///
/// Among shared ancestors the one minimising `distance_a + distance_b` wins;
/// ties go to the smaller `max(distance_a, distance_b)`, then to the smaller
/// id so the answer is stable.
pub fn resolve_with(a: &Ancestry, b: &Ancestry) -> LcaOutcome {
  if a.person_id == b.person_id {
    return LcaOutcome::SamePerson;
  }

  let (small, large, swapped) = if a.len() <= b.len() {
    (a, b, false)
  } else {
    (b, a, true)
  };

  small
    .with_self()
    .filter_map(|(id, d_small)| {
      large.distance_to(id).map(|d_large| {
        let (distance_a, distance_b) =
          if swapped { (d_large, d_small) } else { (d_small, d_large) };
        (id, distance_a, distance_b)
      })
    })
    .min_by_key(|&(id, da, db)| (da + db, da.max(db), id))
    .map_or(LcaOutcome::NoCommonAncestor, |(lca_id, distance_a, distance_b)| {
      LcaOutcome::Common { lca_id, distance_a, distance_b }
    })
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    Error,
    family::Gender,
    graph::fixtures::{FamilyBuilder, three_generations},
  };

  fn ctx() -> ResolveContext { ResolveContext::default() }

  #[test]
  fn same_person_short_circuits() {
    let t = three_generations();
    let g = t.family.graph();
    for p in [t.h, t.a, t.c, t.s] {
      assert_eq!(resolve(&g, p, p, &ctx()).unwrap(), LcaOutcome::SamePerson);
    }
  }

  #[test]
  fn same_unknown_person_is_not_found() {
    let t = three_generations();
    let g = t.family.graph();
    let id = Uuid::new_v4();
    assert!(matches!(resolve(&g, id, id, &ctx()), Err(Error::PersonNotFound(_))));
  }

  #[test]
  fn siblings_meet_at_a_parent() {
    let t = three_generations();
    let g = t.family.graph();

    let LcaOutcome::Common { lca_id, distance_a, distance_b } =
      resolve(&g, t.a, t.b, &ctx()).unwrap()
    else {
      panic!("expected a common ancestor");
    };
    assert_eq!((distance_a, distance_b), (1, 1));
    assert!(lca_id == t.h || lca_id == t.w);
  }

  #[test]
  fn niece_and_uncle_distances_follow_argument_order() {
    let t = three_generations();
    let g = t.family.graph();

    let forward = resolve(&g, t.c, t.b, &ctx()).unwrap();
    let backward = resolve(&g, t.b, t.c, &ctx()).unwrap();
    assert!(matches!(forward, LcaOutcome::Common { distance_a: 2, distance_b: 1, .. }));
    assert!(matches!(backward, LcaOutcome::Common { distance_a: 1, distance_b: 2, .. }));
  }

  #[test]
  fn direct_ancestor_is_its_own_lca() {
    let t = three_generations();
    let g = t.family.graph();

    assert_eq!(resolve(&g, t.c, t.h, &ctx()).unwrap(), LcaOutcome::Common {
      lca_id:     t.h,
      distance_a: 2,
      distance_b: 0,
    });
  }

  #[test]
  fn resolution_is_symmetric() {
    let t = three_generations();
    let g = t.family.graph();
    let people = [t.h, t.w, t.a, t.s, t.b, t.c];

    for &x in &people {
      for &y in &people {
        let xy = resolve(&g, x, y, &ctx()).unwrap();
        let yx = resolve(&g, y, x, &ctx()).unwrap();
        match (xy, yx) {
          (
            LcaOutcome::Common { lca_id: l1, distance_a: a1, distance_b: b1 },
            LcaOutcome::Common { lca_id: l2, distance_a: a2, distance_b: b2 },
          ) => {
            assert_eq!(l1, l2);
            assert_eq!((a1, b1), (b2, a2));
          }
          (left, right) => assert_eq!(left, right),
        }
      }
    }
  }

  #[test]
  fn spouses_without_shared_ancestry_are_unrelated() {
    let t = three_generations();
    let g = t.family.graph();
    assert_eq!(resolve(&g, t.a, t.s, &ctx()).unwrap(), LcaOutcome::NoCommonAncestor);
    assert_eq!(resolve(&g, t.s, t.b, &ctx()).unwrap(), LcaOutcome::NoCommonAncestor);
  }

  #[test]
  fn first_cousins_meet_at_a_grandparent() {
    let mut f = FamilyBuilder::default();
    let g = f.person("G", Gender::Male, 1, None);
    let gw = f.person("GW", Gender::Female, 1, None);
    let p1 = f.person("P1", Gender::Male, 2, None);
    let p2 = f.person("P2", Gender::Female, 2, None);
    let s1 = f.person("S1", Gender::Female, 2, None);
    let s2 = f.person("S2", Gender::Male, 2, None);
    let x = f.person("X", Gender::Male, 3, None);
    let y = f.person("Y", Gender::Male, 3, None);
    let m_g = f.marry(g, gw);
    f.child(m_g, p1);
    f.child(m_g, p2);
    let m1 = f.marry(p1, s1);
    f.child(m1, x);
    let m2 = f.marry(s2, p2);
    f.child(m2, y);

    let graph = f.graph();
    let outcome = resolve(&graph, x, y, &ctx()).unwrap();
    assert!(matches!(
      outcome,
      LcaOutcome::Common { distance_a: 2, distance_b: 2, lca_id } if lca_id == g || lca_id == gw
    ));
  }
}
