//! `KinshipEngine`: the request-level entry points.
//!
//! Every call loads one graph scope from the store, builds a [`FamilyGraph`]
//! and runs the pure resolvers on blocking threads. Nothing survives between
//! calls.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  ancestry::{Ancestry, ancestors_of, ancestries_bulk},
  context::{CancelToken, DEFAULT_MAX_DEPTH, ResolveContext},
  error::UnknownCause,
  family::{Branch, BranchId, PersonId},
  graph::FamilyGraph,
  label::LabelTable,
  layout::{FamilyTree, TreeNodeKind, project},
  relationship::{RelationshipInfo, relate, relate_with},
  store::{FamilyStore, GraphScope},
};

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Parent hops walked before data is declared cyclic.
  pub max_depth:          u32,
  /// Blocking threads used by one bulk ancestry computation.
  pub max_workers:        usize,
  /// Per-request deadline; 0 disables it.
  pub request_timeout_ms: u64,
  pub labels:             LabelTable,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      max_depth:          DEFAULT_MAX_DEPTH,
      max_workers:        4,
      request_timeout_ms: 5000,
      labels:             LabelTable::default(),
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// One entry of [`KinshipEngine::relationships_from`]. Exactly one of
/// `relationship` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipResult {
  pub target:       PersonId,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub relationship: Option<RelationshipInfo>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:        Option<String>,
}

impl RelationshipResult {
  fn new(target: PersonId, result: Result<RelationshipInfo>) -> Self {
    match result {
      Ok(info) => Self { target, relationship: Some(info), error: None },
      Err(e) => Self { target, relationship: None, error: Some(e.to_string()) },
    }
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct KinshipEngine<S> {
  store:  Arc<S>,
  config: Arc<EngineConfig>,
}

impl<S> Clone for KinshipEngine<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: Arc::clone(&self.config) }
  }
}

impl<S: FamilyStore> KinshipEngine<S> {
  pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
    Self { store, config: Arc::new(config) }
  }

  pub fn config(&self) -> &EngineConfig { &self.config }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// A fresh context carrying the configured depth bound and deadline.
  pub fn context(&self) -> ResolveContext {
    let cancel = match self.config.request_timeout_ms {
      0 => CancelToken::new(),
      ms => CancelToken::with_timeout(Duration::from_millis(ms)),
    };
    ResolveContext::new(self.config.max_depth, cancel)
  }

  /// Load and index one scope of the family graph.
  pub async fn load(&self, scope: GraphScope) -> Result<Arc<FamilyGraph>> {
    let snapshot = self.store.load_graph_scope(scope).await.map_err(Into::<Error>::into)?;
    tracing::debug!(
      ?scope,
      persons = snapshot.persons.len(),
      marriages = snapshot.marriages.len(),
      links = snapshot.parent_child_links.len(),
      "loaded family graph"
    );

    let graph = FamilyGraph::build(scope, snapshot);
    for v in graph.generation_violations() {
      tracing::warn!(
        parent_id = %v.parent_id,
        child_id = %v.child_id,
        "child generation is not below its parent's"
      );
    }
    Ok(Arc::new(graph))
  }

  /// Kinship of `b` as seen from `a`.
  pub async fn relationship(
    &self,
    a: PersonId,
    b: PersonId,
    ctx: &ResolveContext,
  ) -> Result<RelationshipInfo> {
    let graph = self.load(GraphScope::All).await?;
    let config = Arc::clone(&self.config);
    let ctx = ctx.clone();

    let info = blocking(move || relate(&graph, &config.labels, a, b, &ctx))
      .await
      .map_err(degrade)?;
    tracing::debug!(
      person_a = %a,
      person_b = %b,
      relationship = %info.relationship,
      "resolved relationship"
    );
    Ok(info)
  }

  /// Kinship of every target as seen from `a`, in input order.
  ///
  /// Fails as a whole only when `a` cannot be resolved or the context is
  /// cancelled; per-target failures are reported in their entry.
  pub async fn relationships_from(
    &self,
    a: PersonId,
    targets: Vec<PersonId>,
    ctx: &ResolveContext,
  ) -> Result<Vec<RelationshipResult>> {
    let graph = self.load(GraphScope::All).await?;
    graph.person(a)?;

    let ids: Vec<PersonId> = std::iter::once(a).chain(targets.iter().copied()).collect();
    let mut ancestries =
      ancestries_bulk(Arc::clone(&graph), ids, ctx.clone(), self.config.max_workers)
        .await
        .into_iter();
    ctx.checkpoint()?;

    let anchor = ancestries
      .next()
      .unwrap_or(Err(Error::PersonNotFound(a)))
      .map_err(degrade)?;

    let results = targets
      .into_iter()
      .zip(ancestries)
      .map(|(target, ancestry)| {
        let result = ancestry
          .and_then(|anc| relate_with(&graph, &self.config.labels, &anchor, &anc))
          .map_err(degrade);
        RelationshipResult::new(target, result)
      })
      .collect();
    Ok(results)
  }

  /// Lay out a branch (or the whole graph), optionally labelling every person
  /// relative to `relative_to`.
  pub async fn tree(
    &self,
    branch_id: Option<BranchId>,
    relative_to: Option<PersonId>,
    ctx: &ResolveContext,
  ) -> Result<FamilyTree> {
    let root_hint = match branch_id {
      Some(id) => {
        let branch = self
          .store
          .get_branch(id)
          .await
          .map_err(Into::<Error>::into)?
          .ok_or(Error::BranchNotFound(id))?;
        branch.root_person_id
      }
      None => None,
    };

    let scope = GraphScope::from_branch(branch_id);
    let graph = self.load(scope).await?;
    ctx.checkpoint()?;

    let layout_graph = Arc::clone(&graph);
    let mut tree = blocking(move || Ok(project(&layout_graph, root_hint))).await?;

    if let Some(anchor_id) = relative_to {
      let full = match scope {
        GraphScope::All => graph,
        GraphScope::Branch(_) => self.load(GraphScope::All).await?,
      };
      self.annotate(&mut tree, &full, anchor_id, ctx).await?;
    }

    tracing::debug!(
      ?scope,
      nodes = tree.nodes.len(),
      edges = tree.edges.len(),
      "projected family tree"
    );
    Ok(tree)
  }

  async fn annotate(
    &self,
    tree: &mut FamilyTree,
    graph: &Arc<FamilyGraph>,
    anchor_id: PersonId,
    ctx: &ResolveContext,
  ) -> Result<()> {
    graph.person(anchor_id)?;
    tree.relative_to = Some(anchor_id);

    let people: Vec<(usize, PersonId)> = tree
      .nodes
      .iter()
      .enumerate()
      .filter_map(|(i, node)| match node.kind {
        TreeNodeKind::Person { person_id, .. } => Some((i, person_id)),
        _ => None,
      })
      .collect();

    let ids: Vec<PersonId> = std::iter::once(anchor_id)
      .chain(people.iter().map(|(_, id)| *id))
      .collect();
    let mut ancestries =
      ancestries_bulk(Arc::clone(graph), ids, ctx.clone(), self.config.max_workers)
        .await
        .into_iter();
    ctx.checkpoint()?;

    let anchor = ancestries
      .next()
      .unwrap_or(Err(Error::PersonNotFound(anchor_id)))
      .map_err(degrade)?;

    for ((idx, person_id), ancestry) in people.into_iter().zip(ancestries) {
      let labelled = ancestry
        .and_then(|anc| relate_with(graph, &self.config.labels, &anchor, &anc));
      match labelled {
        Ok(info) => tree.nodes[idx].relationship = Some(info.to_label()),
        Err(e) => {
          let e = degrade(e);
          tracing::debug!(%person_id, error = %e, "tree node left unlabelled");
        }
      }
    }
    Ok(())
  }

  pub async fn branches(&self) -> Result<Vec<Branch>> {
    self.store.list_branches().await.map_err(Into::into)
  }

  /// The ancestry index of one person.
  pub async fn ancestors(&self, person_id: PersonId, ctx: &ResolveContext) -> Result<Ancestry> {
    let graph = self.load(GraphScope::All).await?;
    let ctx = ctx.clone();
    blocking(move || ancestors_of(&graph, person_id, &ctx)).await
  }
}

/// Run a pure resolver on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
  F: FnOnce() -> Result<T> + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|e| Error::Worker(e.to_string()))?
}

/// Cyclic data is an integrity problem in the records, not a caller error.
fn degrade(err: Error) -> Error {
  match err {
    Error::Cyclic { person_id, max_depth } => {
      tracing::warn!(
        %person_id,
        max_depth,
        "cyclic parent/child data; relationship reported as unknown"
      );
      Error::UnknownRelationship(UnknownCause::CyclicData { person_id })
    }
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::{
    family::{Gender, Person},
    graph::fixtures::{FamilyBuilder, three_generations},
    label::RelationshipCode,
    layout::person_node_id,
    store::GraphSnapshot,
  };

  /// Serves one fixed snapshot. Branch scopes filter nothing; the graph's
  /// scope decides membership.
  struct MemoryStore {
    snapshot: GraphSnapshot,
    branches: Vec<Branch>,
  }

  impl FamilyStore for MemoryStore {
    type Error = Error;

    async fn load_graph_scope(&self, scope: GraphScope) -> Result<GraphSnapshot> {
      if let GraphScope::Branch(id) = scope
        && !self.branches.iter().any(|b| b.branch_id == id)
      {
        return Err(Error::BranchNotFound(id));
      }
      Ok(self.snapshot.clone())
    }

    async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
      Ok(self.snapshot.persons.iter().find(|p| p.person_id == id).cloned())
    }

    async fn get_branch(&self, id: Uuid) -> Result<Option<Branch>> {
      Ok(self.branches.iter().find(|b| b.branch_id == id).cloned())
    }

    async fn list_branches(&self) -> Result<Vec<Branch>> { Ok(self.branches.clone()) }
  }

  fn engine_for(family: &FamilyBuilder, branch: Branch) -> KinshipEngine<MemoryStore> {
    let store = MemoryStore {
      snapshot: family.snapshot.clone(),
      branches: vec![branch],
    };
    KinshipEngine::new(Arc::new(store), EngineConfig::default())
  }

  fn branch(id: BranchId, root: PersonId) -> Branch {
    Branch {
      branch_id:      id,
      name:           "Trah Hartono".into(),
      root_person_id: Some(root),
      person_count:   4,
      living_count:   4,
      spouse_count:   2,
    }
  }

  #[tokio::test]
  async fn relationship_resolves_through_the_store() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));

    let info = engine.relationship(t.c, t.b, &engine.context()).await.unwrap();
    assert_eq!(info.relationship, RelationshipCode::AuntUncle);
    assert_eq!((info.distance_a, info.distance_b), (Some(2), Some(1)));
  }

  #[tokio::test]
  async fn unknown_person_is_not_found() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));

    let err = engine
      .relationship(t.c, Uuid::new_v4(), &engine.context())
      .await
      .unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn cyclic_data_degrades_to_unknown() {
    let mut f = FamilyBuilder::default();
    let (a, b) = add_cyclic_pair(&mut f);
    let engine = engine_for(&f, branch(Uuid::new_v4(), a));

    let err = engine.relationship(a, b, &engine.context()).await.unwrap_err();
    assert!(matches!(
      err,
      Error::UnknownRelationship(UnknownCause::CyclicData { .. })
    ));
  }

  /// A and B are each other's parent; their spouses have no parents.
  fn add_cyclic_pair(f: &mut FamilyBuilder) -> (PersonId, PersonId) {
    let a = f.person("A", Gender::Male, 1, None);
    let aw = f.person("AW", Gender::Female, 1, None);
    let b = f.person("B", Gender::Male, 2, None);
    let bw = f.person("BW", Gender::Female, 2, None);
    let m_a = f.marry(a, aw);
    f.child(m_a, b);
    let m_b = f.marry(b, bw);
    f.child(m_b, a);
    (a, b)
  }

  #[tokio::test]
  async fn self_relationship_needs_no_ancestry() {
    let mut f = FamilyBuilder::default();
    let (a, _) = add_cyclic_pair(&mut f);
    let engine = engine_for(&f, branch(Uuid::new_v4(), a));

    let info = engine.relationship(a, a, &engine.context()).await.unwrap();
    assert_eq!(info.relationship, RelationshipCode::Myself);
    assert_eq!((info.distance_a, info.distance_b), (Some(0), Some(0)));
    assert_eq!(info.path_ids, vec![a]);
  }

  #[tokio::test]
  async fn tree_leaves_cyclic_people_unlabelled() {
    let mut t = three_generations();
    let (a, b) = add_cyclic_pair(&mut t.family);
    let engine = engine_for(&t.family, branch(t.branch, t.h));

    let tree = engine.tree(None, Some(t.c), &engine.context()).await.unwrap();
    let label_of = |id| {
      tree
        .node(&person_node_id(id))
        .map(|n| n.relationship.as_ref().map(|l| l.relationship))
    };
    assert_eq!(label_of(a), Some(None));
    assert_eq!(label_of(b), Some(None));
    assert_eq!(label_of(t.h), Some(Some(RelationshipCode::Grandparent)));
    assert_eq!(label_of(t.b), Some(Some(RelationshipCode::AuntUncle)));
  }

  #[tokio::test]
  async fn cancelled_context_returns_cancelled() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));
    let ctx = engine.context();
    ctx.cancel.cancel();

    let err = engine.relationship(t.c, t.b, &ctx).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    let err = engine.relationships_from(t.c, vec![t.b], &ctx).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
  }

  #[tokio::test]
  async fn batch_keeps_order_and_reports_per_target_errors() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));
    let missing = Uuid::new_v4();

    let results = engine
      .relationships_from(t.c, vec![t.h, missing, t.b], &engine.context())
      .await
      .unwrap();
    let targets: Vec<PersonId> = results.iter().map(|r| r.target).collect();
    assert_eq!(targets, vec![t.h, missing, t.b]);

    assert_eq!(
      results[0].relationship.as_ref().map(|r| r.relationship),
      Some(RelationshipCode::Grandparent)
    );
    assert!(results[1].relationship.is_none());
    assert!(results[1].error.is_some());
    assert_eq!(
      results[2].relationship.as_ref().map(|r| r.relationship),
      Some(RelationshipCode::AuntUncle)
    );
  }

  #[tokio::test]
  async fn batch_matches_single_resolution() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));
    let ctx = engine.context();
    let people = [t.h, t.w, t.a, t.s, t.b, t.c];

    let batch = engine.relationships_from(t.c, people.to_vec(), &ctx).await.unwrap();
    for (target, result) in people.iter().zip(batch) {
      let single = engine.relationship(t.c, *target, &ctx).await.unwrap();
      assert_eq!(result.relationship, Some(single));
    }
  }

  #[tokio::test]
  async fn tree_for_missing_branch_is_not_found() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));

    let err = engine
      .tree(Some(Uuid::new_v4()), None, &engine.context())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::BranchNotFound(_)));
  }

  #[tokio::test]
  async fn tree_is_labelled_relative_to_a_person() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));

    let tree = engine
      .tree(Some(t.branch), Some(t.c), &engine.context())
      .await
      .unwrap();
    assert_eq!(tree.relative_to, Some(t.c));

    let label_of = |id| {
      tree
        .node(&person_node_id(id))
        .and_then(|n| n.relationship.as_ref())
        .map(|l| l.relationship)
    };
    assert_eq!(label_of(t.c), Some(RelationshipCode::Myself));
    assert_eq!(label_of(t.a), Some(RelationshipCode::Parent));
    assert_eq!(label_of(t.h), Some(RelationshipCode::Grandparent));
    assert_eq!(label_of(t.b), Some(RelationshipCode::AuntUncle));
  }

  #[tokio::test]
  async fn tree_is_stable_across_calls() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));
    let ctx = engine.context();

    let first = engine.tree(Some(t.branch), None, &ctx).await.unwrap();
    let second = engine.tree(Some(t.branch), None, &ctx).await.unwrap();
    assert_eq!(
      serde_json::to_string(&first).unwrap(),
      serde_json::to_string(&second).unwrap()
    );
  }

  #[tokio::test]
  async fn branches_come_from_the_store() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));

    let branches = engine.branches().await.unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].root_person_id, Some(t.h));
  }

  #[tokio::test]
  async fn ancestors_view_lists_every_ancestor() {
    let t = three_generations();
    let engine = engine_for(&t.family, branch(t.branch, t.h));

    let anc = engine.ancestors(t.c, &engine.context()).await.unwrap();
    assert_eq!(anc.len(), 4);
    assert_eq!(anc.distance_to(t.h), Some(2));
  }
}
