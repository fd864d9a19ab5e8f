//! Tree layout projector: positions people and marriages on a grid.
//!
//! Rows (`rank`) are generations. Within a row, `column` is the order in
//! which a depth-first walk placed the node: a person, then each of their
//! marriages followed by the spouse, then the children of that marriage in
//! birth order. Spouses therefore sit either side of their marriage node and
//! children fan out below it.
//!
//! The walk only ever iterates sorted collections, so the same graph always
//! yields the same layout.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  family::{BranchId, Gender, Marriage, MarriageId, Person, PersonId},
  graph::FamilyGraph,
  label::Label,
  store::GraphScope,
};

// ─── Output types ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNodeKind {
  Person {
    person_id:  PersonId,
    name:       String,
    gender:     Gender,
    is_alive:   bool,
    generation: i32,
    photo_url:  Option<String>,
  },
  /// Synthetic node joining two spouses; children hang from it.
  Marriage {
    marriage_id: MarriageId,
    husband_id:  PersonId,
    wife_id:     PersonId,
    is_active:   bool,
  },
  /// A referenced person outside the requested scope. Links out to the
  /// branch that owns their subtree, if any.
  Ghost {
    person_id:        PersonId,
    name:             String,
    gender:           Gender,
    remote_branch_id: Option<BranchId>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
  pub id:           String,
  #[serde(flatten)]
  pub kind:         TreeNodeKind,
  pub rank:         i32,
  pub column:       u32,
  /// How this person relates to the tree's `relative_to` person, if one was
  /// requested.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub relationship: Option<Label>,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
  /// Person or ghost -> marriage.
  Spouse,
  /// Marriage -> child.
  Child,
}

#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TreeEdge {
  pub source: String,
  pub target: String,
  pub kind:   EdgeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyTree {
  pub scope:       GraphScope,
  pub relative_to: Option<PersonId>,
  pub nodes:       Vec<TreeNode>,
  pub edges:       Vec<TreeEdge>,
}

impl FamilyTree {
  pub fn node(&self, id: &str) -> Option<&TreeNode> {
    self.nodes.iter().find(|n| n.id == id)
  }
}

pub fn person_node_id(id: PersonId) -> String { format!("person:{id}") }

pub fn ghost_node_id(id: PersonId) -> String { format!("ghost:{id}") }

pub fn marriage_node_id(id: MarriageId) -> String { format!("marriage:{id}") }

// ─── Projection ──────────────────────────────────────────────────────────────

/// Lay out every in-scope person of `graph`, starting from `root_hint` (the
/// branch root) when it is in scope.
pub fn project(graph: &FamilyGraph, root_hint: Option<PersonId>) -> FamilyTree {
  let mut members: Vec<&Person> = graph
    .persons()
    .filter(|p| graph.scope().includes(p))
    .collect();
  members.sort_by_key(|p| (p.generation, p.birth_order, p.person_id));

  let mut projector = Projector::new(graph);

  if let Some(root) = root_hint.filter(|id| graph.in_scope(*id)) {
    projector.visit_root(root);
  }
  let roots: Vec<PersonId> = members
    .iter()
    .filter(|p| graph.parents_of(p.person_id).iter().all(|id| !graph.in_scope(*id)))
    .map(|p| p.person_id)
    .collect();
  for root in roots {
    projector.visit_root(root);
  }
  // Members that only sit on parent cycles are never reached from a root.
  for p in &members {
    projector.visit(p.person_id);
  }

  projector.finish(graph.scope())
}

struct Projector<'g> {
  graph:      &'g FamilyGraph,
  next_col:   BTreeMap<i32, u32>,
  node_ids:   HashMap<PersonId, String>,
  marriages:  HashSet<MarriageId>,
  expanded:   HashSet<PersonId>,
  nodes:      Vec<TreeNode>,
  edges:      BTreeSet<TreeEdge>,
}

impl<'g> Projector<'g> {
  fn new(graph: &'g FamilyGraph) -> Self {
    Self {
      graph,
      next_col: BTreeMap::new(),
      node_ids: HashMap::new(),
      marriages: HashSet::new(),
      expanded: HashSet::new(),
      nodes: Vec::new(),
      edges: BTreeSet::new(),
    }
  }

  fn column(&mut self, rank: i32) -> u32 {
    let col = self.next_col.entry(rank).or_insert(0);
    let out = *col;
    *col += 1;
    out
  }

  /// Place a person (or ghost) node if not yet placed; returns its node id.
  fn place_person(&mut self, id: PersonId) -> Option<String> {
    if let Some(node_id) = self.node_ids.get(&id) {
      return Some(node_id.clone());
    }
    let person = self.graph.person(id).ok()?;
    let rank = person.generation;
    let column = self.column(rank);

    let (node_id, kind) = if self.graph.in_scope(id) {
      (person_node_id(id), TreeNodeKind::Person {
        person_id:  id,
        name:       person.display_name().to_owned(),
        gender:     person.gender,
        is_alive:   person.is_alive,
        generation: person.generation,
        photo_url:  person.photo_url.clone(),
      })
    } else {
      (ghost_node_id(id), TreeNodeKind::Ghost {
        person_id:        id,
        name:             person.display_name().to_owned(),
        gender:           person.gender,
        remote_branch_id: person.branch_id,
      })
    };

    self.nodes.push(TreeNode {
      id: node_id.clone(),
      kind,
      rank,
      column,
      relationship: None,
    });
    self.node_ids.insert(id, node_id.clone());
    Some(node_id)
  }

  fn place_marriage(&mut self, m: &Marriage) -> String {
    let node_id = marriage_node_id(m.marriage_id);
    if !self.marriages.insert(m.marriage_id) {
      return node_id;
    }
    let rank = [m.husband_id, m.wife_id]
      .iter()
      .filter_map(|id| self.graph.person(*id).ok())
      .map(|p| p.generation)
      .max()
      .unwrap_or_default();
    let column = self.column(rank);
    self.nodes.push(TreeNode {
      id: node_id.clone(),
      kind: TreeNodeKind::Marriage {
        marriage_id: m.marriage_id,
        husband_id:  m.husband_id,
        wife_id:     m.wife_id,
        is_active:   m.is_active,
      },
      rank,
      column,
      relationship: None,
    });
    node_id
  }

  fn edge(&mut self, source: &str, target: &str, kind: EdgeKind) {
    self.edges.insert(TreeEdge {
      source: source.to_owned(),
      target: target.to_owned(),
      kind,
    });
  }

  /// A root may still have parents outside the scope; show them as ghosts
  /// above it before walking down.
  fn visit_root(&mut self, id: PersonId) {
    if !self.node_ids.contains_key(&id)
      && let Some(m) = self.graph.parent_marriage_of(id)
    {
      let m = m.clone();
      let husband = self.place_person(m.husband_id);
      let marriage = self.place_marriage(&m);
      let wife = self.place_person(m.wife_id);
      for spouse in [husband, wife].into_iter().flatten() {
        self.edge(&spouse, &marriage, EdgeKind::Spouse);
      }
      if let Some(child) = self.place_person(id) {
        self.edge(&marriage, &child, EdgeKind::Child);
      }
    }
    self.visit(id);
  }

  fn visit(&mut self, id: PersonId) {
    let Some(node_id) = self.place_person(id) else { return };
    if !self.graph.in_scope(id) || !self.expanded.insert(id) {
      return;
    }

    let graph = self.graph;
    let mut in_scope_spouses = Vec::new();
    for m in graph.marriages_of(id) {
      let marriage = self.place_marriage(m);
      self.edge(&node_id, &marriage, EdgeKind::Spouse);

      if let Some(spouse_id) = m.spouse_of(id)
        && let Some(spouse) = self.place_person(spouse_id)
      {
        self.edge(&spouse, &marriage, EdgeKind::Spouse);
        if graph.in_scope(spouse_id) {
          in_scope_spouses.push(spouse_id);
        }
      }

      for link in graph.children_of_marriage(m.marriage_id) {
        if let Some(child) = self.place_person(link.child_id) {
          self.edge(&marriage, &child, EdgeKind::Child);
        }
        self.visit(link.child_id);
      }
    }

    for spouse_id in in_scope_spouses {
      self.visit(spouse_id);
    }
  }

  fn finish(mut self, scope: GraphScope) -> FamilyTree {
    self.nodes.sort_by(|a, b| (a.rank, a.column).cmp(&(b.rank, b.column)));
    FamilyTree {
      scope,
      relative_to: None,
      nodes: self.nodes,
      edges: self.edges.into_iter().collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::graph::fixtures::three_generations;

  fn kinds(tree: &FamilyTree) -> (usize, usize, usize) {
    let mut counts = (0, 0, 0);
    for n in &tree.nodes {
      match n.kind {
        TreeNodeKind::Person { .. } => counts.0 += 1,
        TreeNodeKind::Marriage { .. } => counts.1 += 1,
        TreeNodeKind::Ghost { .. } => counts.2 += 1,
      }
    }
    counts
  }

  #[test]
  fn whole_family_has_no_ghosts() {
    let t = three_generations();
    let tree = project(&t.family.graph(), Some(t.h));

    assert_eq!(kinds(&tree), (6, 2, 0));
    assert_eq!(tree.edges.len(), 7);
  }

  #[test]
  fn branch_scope_turns_outsiders_into_ghosts() {
    let t = three_generations();
    let graph = t.family.graph_for(GraphScope::Branch(t.branch));
    let tree = project(&graph, Some(t.h));

    assert_eq!(kinds(&tree), (4, 2, 2));
    let ghost = tree.node(&ghost_node_id(t.s)).unwrap();
    assert!(matches!(
      ghost.kind,
      TreeNodeKind::Ghost { remote_branch_id: None, .. }
    ));
    assert!(tree.node(&person_node_id(t.s)).is_none());
  }

  #[test]
  fn spouses_flank_their_marriage_and_children_follow_birth_order() {
    let t = three_generations();
    let tree = project(&t.family.graph(), Some(t.h));

    let col = |id: &str| tree.node(id).map(|n| (n.rank, n.column)).unwrap();
    assert_eq!(col(&person_node_id(t.h)), (1, 0));
    assert_eq!(col(&person_node_id(t.w)), (1, 2));
    assert_eq!(col(&person_node_id(t.a)), (2, 0));
    assert_eq!(col(&person_node_id(t.s)), (2, 2));
    assert_eq!(col(&person_node_id(t.b)), (2, 3));
    assert_eq!(col(&person_node_id(t.c)), (3, 0));
  }

  #[test]
  fn edges_join_spouses_through_the_marriage_node() {
    let t = three_generations();
    let tree = project(&t.family.graph(), Some(t.h));
    let marriage = tree
      .nodes
      .iter()
      .find(|n| matches!(n.kind, TreeNodeKind::Marriage { husband_id, .. } if husband_id == t.a))
      .unwrap();

    let has = |source: &str, target: &str, kind| {
      tree.edges.contains(&TreeEdge {
        source: source.to_owned(),
        target: target.to_owned(),
        kind,
      })
    };
    assert!(has(&person_node_id(t.a), &marriage.id, EdgeKind::Spouse));
    assert!(has(&person_node_id(t.s), &marriage.id, EdgeKind::Spouse));
    assert!(has(&marriage.id, &person_node_id(t.c), EdgeKind::Child));
  }

  #[test]
  fn layout_is_identical_across_calls() {
    let t = three_generations();
    let graph = t.family.graph_for(GraphScope::Branch(t.branch));

    let first = serde_json::to_string(&project(&graph, Some(t.h))).unwrap();
    for _ in 0..5 {
      let again = serde_json::to_string(&project(&graph, Some(t.h))).unwrap();
      assert_eq!(first, again);
    }
  }

  #[test]
  fn root_with_parents_elsewhere_shows_ghost_parents() {
    let t = three_generations();
    // Scope a graph to A's line only by moving A and C into a new branch.
    let sub = uuid::Uuid::new_v4();
    let mut family = t.family;
    for p in family.snapshot.persons.iter_mut() {
      if p.person_id == t.a || p.person_id == t.c {
        p.branch_id = Some(sub);
      }
    }
    let graph = family.graph_for(GraphScope::Branch(sub));
    let tree = project(&graph, Some(t.a));

    let father = tree.node(&ghost_node_id(t.h)).unwrap();
    assert!(matches!(
      father.kind,
      TreeNodeKind::Ghost { remote_branch_id: Some(b), .. } if b == t.branch
    ));
    assert!(tree.node(&ghost_node_id(t.w)).is_some());
    assert!(tree.node(&ghost_node_id(t.b)).is_none());
  }
}
