//! Assembles a [`RelationshipInfo`] from ancestry, LCA and labels.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  ancestry::{Ancestry, ancestors_of},
  context::ResolveContext,
  family::{Gender, Person, PersonId},
  graph::FamilyGraph,
  label::{Kinship, Label, LabelContext, LabelTable, RelationshipCode, Seniority},
  lca::{LcaOutcome, resolve_with},
};

/// The computed kinship between two people. Never persisted.
///
/// Read as "B is A's `label`".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipInfo {
  pub person_a:       PersonId,
  pub person_b:       PersonId,
  pub relationship:   RelationshipCode,
  pub label:          String,
  pub label_javanese: String,
  pub sapaan:         Option<String>,
  pub lca_id:         Option<PersonId>,
  pub distance_a:     Option<u32>,
  pub distance_b:     Option<u32>,
  /// The two lines share only one parent below the common ancestor.
  pub half:           bool,
  /// Names from A up to the common ancestor and down to B.
  pub path:           String,
  pub path_ids:       Vec<PersonId>,
}

impl RelationshipInfo {
  fn from_label(a: PersonId, b: PersonId, label: Label) -> Self {
    Self {
      person_a:       a,
      person_b:       b,
      relationship:   label.relationship,
      label:          label.label,
      label_javanese: label.label_javanese,
      sapaan:         label.sapaan,
      lca_id:         None,
      distance_a:     None,
      distance_b:     None,
      half:           false,
      path:           String::new(),
      path_ids:       Vec::new(),
    }
  }

  pub fn to_label(&self) -> Label {
    Label {
      relationship:   self.relationship,
      label:          self.label.clone(),
      label_javanese: self.label_javanese.clone(),
      sapaan:         self.sapaan.clone(),
    }
  }
}

/// Relate `b` to `a` within `graph`.
pub fn relate(
  graph: &FamilyGraph,
  labels: &LabelTable,
  a: PersonId,
  b: PersonId,
  ctx: &ResolveContext,
) -> Result<RelationshipInfo> {
  if a == b {
    return myself(graph, labels, a);
  }
  let ancestry_a = ancestors_of(graph, a, ctx)?;
  let ancestry_b = ancestors_of(graph, b, ctx)?;
  relate_with(graph, labels, &ancestry_a, &ancestry_b)
}

/// The "self" relationship. Needs no ancestry, so it holds even for people
/// on malformed parent data.
fn myself(graph: &FamilyGraph, labels: &LabelTable, id: PersonId) -> Result<RelationshipInfo> {
  let person = graph.person(id)?;
  let label = labels.label(0, 0, &LabelContext::new(person.gender))?;
  let mut info = RelationshipInfo::from_label(id, id, label);
  info.lca_id = Some(id);
  info.distance_a = Some(0);
  info.distance_b = Some(0);
  info.path = person.display_name().to_owned();
  info.path_ids = vec![id];
  Ok(info)
}

/// Relate two people whose ancestries are already computed.
pub fn relate_with(
  graph: &FamilyGraph,
  labels: &LabelTable,
  ancestry_a: &Ancestry,
  ancestry_b: &Ancestry,
) -> Result<RelationshipInfo> {
  let a = ancestry_a.person_id;
  let b = ancestry_b.person_id;
  let person_a = graph.person(a)?;
  let person_b = graph.person(b)?;

  match resolve_with(ancestry_a, ancestry_b) {
    LcaOutcome::SamePerson => myself(graph, labels, a),

    LcaOutcome::Common { lca_id, distance_a, distance_b } => {
      let kinship = Kinship::classify(distance_a, distance_b);
      let mut cx = LabelContext::new(person_b.gender);

      if kinship.is_collateral()
        && let (Some(head_a), Some(head_b)) = (
          ancestry_a.child_toward(lca_id),
          ancestry_b.child_toward(lca_id),
        )
      {
        cx.seniority = seniority(graph, head_a, head_b);
        if let Some(shared) = half_relation(graph, head_a, head_b) {
          cx.half = true;
          cx.shared_parent = Some(shared);
        }
      }

      let label = labels.label(distance_a, distance_b, &cx)?;
      let path_ids = join_paths(ancestry_a, ancestry_b, lca_id);
      let path = render_path(graph, &path_ids, distance_a as usize);

      let mut info = RelationshipInfo::from_label(a, b, label);
      info.lca_id = Some(lca_id);
      info.distance_a = Some(distance_a);
      info.distance_b = Some(distance_b);
      info.half = cx.half;
      info.path = path;
      info.path_ids = path_ids;
      Ok(info)
    }

    LcaOutcome::NoCommonAncestor => {
      if graph.spouses_of(a).contains(&b) {
        let mut info = RelationshipInfo::from_label(a, b, labels.spouse_label(person_b.gender));
        info.path = format!("{} ═ {}", person_a.display_name(), person_b.display_name());
        info.path_ids = vec![a, b];
        Ok(info)
      } else {
        Ok(RelationshipInfo::from_label(a, b, labels.unrelated()))
      }
    }
  }
}

/// `a … lca … b` as ids.
fn join_paths(ancestry_a: &Ancestry, ancestry_b: &Ancestry, lca_id: PersonId) -> Vec<PersonId> {
  let up = ancestry_a.path_to(lca_id).unwrap_or_default();
  let mut down = ancestry_b.path_to(lca_id).unwrap_or_default();
  down.pop();
  down.reverse();
  up.into_iter().chain(down).collect()
}

/// "Cahya → Andi → Hartono ← Bayu": arrows point towards the ancestor.
fn render_path(graph: &FamilyGraph, ids: &[PersonId], up_len: usize) -> String {
  let mut out = String::new();
  for (i, id) in ids.iter().enumerate() {
    let name = graph
      .person(*id)
      .map(Person::display_name)
      .unwrap_or("?");
    if i > 0 {
      out.push_str(if i <= up_len { " → " } else { " ← " });
    }
    out.push_str(name);
  }
  out
}

/// Compare the two people just below the common ancestor. Earlier birth is
/// senior; birth date wins over recorded birth order.
fn seniority(graph: &FamilyGraph, head_a: PersonId, head_b: PersonId) -> Seniority {
  let (Ok(pa), Ok(pb)) = (graph.person(head_a), graph.person(head_b)) else {
    return Seniority::Unknown;
  };

  let order = match (pa.birth_date, pb.birth_date) {
    (Some(da), Some(db)) if da != db => Some(db.cmp(&da)),
    _ => birth_rank(graph, pa)
      .zip(birth_rank(graph, pb))
      .filter(|(ra, rb)| ra != rb)
      .map(|(ra, rb)| rb.cmp(&ra)),
  };

  match order {
    Some(Ordering::Less) => Seniority::Elder,
    Some(Ordering::Greater) => Seniority::Younger,
    _ => Seniority::Unknown,
  }
}

fn birth_rank(graph: &FamilyGraph, person: &Person) -> Option<u32> {
  person.birth_order.or_else(|| {
    let m = graph.parent_marriage_of(person.person_id)?;
    graph
      .children_of_marriage(m.marriage_id)
      .iter()
      .find(|l| l.child_id == person.person_id)
      .map(|l| l.birth_order)
  })
}

/// If the two heads were born into different marriages sharing one parent,
/// the gender of that parent.
fn half_relation(graph: &FamilyGraph, head_a: PersonId, head_b: PersonId) -> Option<Gender> {
  let ma = graph.parent_marriage_of(head_a)?;
  let mb = graph.parent_marriage_of(head_b)?;
  if ma.marriage_id == mb.marriage_id {
    return None;
  }
  let shared = [ma.husband_id, ma.wife_id]
    .into_iter()
    .find(|id| mb.involves(*id))?;
  graph.person(shared).ok().map(|p| p.gender)
}
