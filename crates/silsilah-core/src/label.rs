//! Relationship labeler: turns an LCA distance pair into kinship labels.
//!
//! Labels are always read as "what B is to A", where `distance_a` is the
//! number of parent hops from A to the common ancestor and `distance_b` the
//! same for B. `(2, 1)` therefore means B is A's aunt or uncle.
//!
//! Three strings come out of every label: the English term, the Javanese
//! kinship term, and the Javanese form of address (sapaan) that A would use
//! for B. Javanese terms and the table bounds are configuration; a pair the
//! table does not cover is reported as [`Error::UnknownRelationship`].

use serde::{Deserialize, Serialize};

use crate::{Error, Result, family::Gender};

// ─── Shape ───────────────────────────────────────────────────────────────────

/// The shape of a blood relationship, from A's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Kinship {
  Myself,
  /// B is A's parent (1), grandparent (2), …
  Ancestor { generations: u32 },
  /// B is A's child (1), grandchild (2), …
  Descendant { generations: u32 },
  Sibling,
  /// B is A's aunt/uncle (1), grand-aunt/uncle (2), …
  Pibling { generations: u32 },
  /// B is A's niece/nephew (1), grand-niece/nephew (2), …
  Nibling { generations: u32 },
  Cousin {
    degree:     u32,
    removed:    u32,
    /// B sits in an older generation than A.
    elder_line: bool,
  },
}

impl Kinship {
  pub fn classify(distance_a: u32, distance_b: u32) -> Self {
    match (distance_a, distance_b) {
      (0, 0) => Self::Myself,
      (a, 0) => Self::Ancestor { generations: a },
      (0, b) => Self::Descendant { generations: b },
      (1, 1) => Self::Sibling,
      (a, 1) => Self::Pibling { generations: a - 1 },
      (1, b) => Self::Nibling { generations: b - 1 },
      (a, b) => Self::Cousin {
        degree:     a.min(b) - 1,
        removed:    a.abs_diff(b),
        elder_line: a > b,
      },
    }
  }

  /// Whether A and B descend from the common ancestor through different
  /// children (as opposed to one being the other's ancestor).
  pub fn is_collateral(&self) -> bool {
    matches!(
      self,
      Self::Sibling | Self::Pibling { .. } | Self::Nibling { .. } | Self::Cousin { .. }
    )
  }
}

/// Generation difference between B and A; positive when B is older.
pub fn generation_gap(distance_a: u32, distance_b: u32) -> i64 {
  i64::from(distance_a) - i64::from(distance_b)
}

// ─── Codes ───────────────────────────────────────────────────────────────────

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
  strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelationshipCode {
  #[serde(rename = "self")]
  #[strum(serialize = "self")]
  Myself,
  Parent,
  Child,
  Grandparent,
  Grandchild,
  GreatGrandparent,
  GreatGrandchild,
  Sibling,
  HalfSibling,
  AuntUncle,
  NieceNephew,
  GrandAuntUncle,
  GrandNieceNephew,
  Cousin,
  Spouse,
  Unrelated,
}

/// Which side of the family is senior, seen from A.
///
/// For collateral kin Javanese ranks by the two lines below the common
/// ancestor, not by personal age: the child of an elder sibling is "Mas"
/// even when younger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
  /// B's line is older than A's.
  Elder,
  Younger,
  #[default]
  Unknown,
}

/// Facts about the pair that the distances alone do not carry.
#[derive(Debug, Clone, Copy)]
pub struct LabelContext {
  pub target_gender: Gender,
  pub seniority:     Seniority,
  /// The two lines share only one parent below the common ancestor.
  pub half:          bool,
  /// For half relations, the gender of the shared parent.
  pub shared_parent: Option<Gender>,
}

impl LabelContext {
  pub fn new(target_gender: Gender) -> Self {
    Self {
      target_gender,
      seniority: Seniority::Unknown,
      half: false,
      shared_parent: None,
    }
  }
}

/// The labels for one relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
  pub relationship:   RelationshipCode,
  pub label:          String,
  pub label_javanese: String,
  /// How A addresses B. Absent for "self".
  pub sapaan:         Option<String>,
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// A term with male and female forms. Terms without gender repeat the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderedTerm {
  pub male:   String,
  pub female: String,
}

impl GenderedTerm {
  pub fn new(male: &str, female: &str) -> Self {
    Self { male: male.to_owned(), female: female.to_owned() }
  }

  pub fn same(term: &str) -> Self { Self::new(term, term) }

  pub fn pick(&self, gender: Gender) -> &str {
    match gender {
      Gender::Male => &self.male,
      Gender::Female => &self.female,
    }
  }
}

/// Forms of address keyed by generation gap.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SapaanTable {
  /// Grandparents and anyone else two generations up.
  pub grandparent:  GenderedTerm,
  /// Prefix for three or more generations up, joined to the ancestor term.
  pub elder_prefix: String,
  pub peer_elder:   GenderedTerm,
  pub peer_younger: GenderedTerm,
  /// Anyone in a younger generation.
  pub junior:       GenderedTerm,
  pub spouse:       GenderedTerm,
}

impl Default for SapaanTable {
  fn default() -> Self {
    Self {
      grandparent:  GenderedTerm::new("Mbah Kakung", "Mbah Putri"),
      elder_prefix: "Mbah".into(),
      peer_elder:   GenderedTerm::new("Mas", "Mbak"),
      peer_younger: GenderedTerm::same("Dhik"),
      junior:       GenderedTerm::new("Le", "Nduk"),
      spouse:       GenderedTerm::new("Mas", "Dhik"),
    }
  }
}

/// Configured kinship vocabulary. Every list bounds the relationships it
/// can name: a ten-entry `ancestors` list covers parents up to the tenth
/// generation and nothing beyond.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelTable {
  /// Javanese terms for ancestors; index 0 is the parents.
  pub ancestors:       Vec<GenderedTerm>,
  /// Javanese terms for descendants; index 0 is the children.
  pub descendants:     Vec<GenderedTerm>,
  /// Javanese terms for cousins; index 0 is first cousins.
  pub cousins:         Vec<String>,
  /// Largest generation difference named between cousins.
  pub max_removed:     u32,
  pub sibling:         String,
  pub sibling_elder:   GenderedTerm,
  pub sibling_younger: GenderedTerm,
  pub pibling_elder:   GenderedTerm,
  pub pibling_younger: GenderedTerm,
  pub nibling:         String,
  pub spouse:          GenderedTerm,
  pub sapaan:          SapaanTable,
}

impl Default for LabelTable {
  fn default() -> Self {
    let generations = [
      "Buyut",
      "Canggah",
      "Wareng",
      "Udheg-udheg",
      "Gantung siwur",
      "Gropak senthe",
      "Debog bosok",
      "Galih asem",
    ];
    let mut ancestors = vec![
      GenderedTerm::new("Bapak", "Ibu"),
      GenderedTerm::new("Simbah kakung", "Simbah putri"),
    ];
    ancestors.extend(generations.iter().map(|t| GenderedTerm::same(t)));
    let mut descendants = vec![GenderedTerm::same("Anak"), GenderedTerm::same("Putu")];
    descendants.extend(generations.iter().map(|t| GenderedTerm::same(t)));

    Self {
      ancestors,
      descendants,
      cousins: vec![
        "Sedulur misan".into(),
        "Sedulur mindho".into(),
        "Sedulur mentelu".into(),
      ],
      max_removed: 3,
      sibling: "Sedulur".into(),
      sibling_elder: GenderedTerm::new("Kakang", "Mbakyu"),
      sibling_younger: GenderedTerm::same("Adhi"),
      pibling_elder: GenderedTerm::new("Pakdhe", "Budhe"),
      pibling_younger: GenderedTerm::new("Paklik", "Bulik"),
      nibling: "Ponakan".into(),
      spouse: GenderedTerm::new("Garwa kakung", "Garwa putri"),
      sapaan: SapaanTable::default(),
    }
  }
}

impl LabelTable {
  /// Label the relationship of B to A for the LCA distance pair.
  pub fn label(
    &self,
    distance_a: u32,
    distance_b: u32,
    cx: &LabelContext,
  ) -> Result<Label> {
    let unknown = || Error::unmapped(distance_a, distance_b);
    let g = cx.target_gender;
    let kinship = Kinship::classify(distance_a, distance_b);

    let (relationship, label, label_javanese) = match kinship {
      Kinship::Myself => {
        return Ok(Label {
          relationship:   RelationshipCode::Myself,
          label:          "self".into(),
          label_javanese: "Awake dhewe".into(),
          sapaan:         None,
        });
      }
      Kinship::Ancestor { generations: n } => {
        let term = self.ancestors.get(n as usize - 1).ok_or_else(unknown)?;
        let code = match n {
          1 => RelationshipCode::Parent,
          2 => RelationshipCode::Grandparent,
          _ => RelationshipCode::GreatGrandparent,
        };
        let base = gendered(g, "father", "mother");
        (code, lineal_english(n, base, "grand"), term.pick(g).to_owned())
      }
      Kinship::Descendant { generations: n } => {
        let term = self.descendants.get(n as usize - 1).ok_or_else(unknown)?;
        let code = match n {
          1 => RelationshipCode::Child,
          2 => RelationshipCode::Grandchild,
          _ => RelationshipCode::GreatGrandchild,
        };
        let base = gendered(g, "son", "daughter");
        (code, lineal_english(n, base, "grand"), term.pick(g).to_owned())
      }
      Kinship::Sibling => {
        let english = half_prefix(cx.half, gendered(g, "brother", "sister"));
        let mut javanese = match cx.seniority {
          Seniority::Elder => self.sibling_elder.pick(g).to_owned(),
          Seniority::Younger => self.sibling_younger.pick(g).to_owned(),
          Seniority::Unknown => self.sibling.clone(),
        };
        if cx.half {
          if let Some(parent) = cx.shared_parent
            && let Some(parents) = self.ancestors.first()
          {
            javanese =
              format!("{javanese} tunggal {}", parents.pick(parent).to_lowercase());
          }
          (RelationshipCode::HalfSibling, english, javanese)
        } else {
          (RelationshipCode::Sibling, english, javanese)
        }
      }
      Kinship::Pibling { generations: n } => {
        let base = gendered(g, "uncle", "aunt");
        let english = half_prefix(cx.half, &greats(n - 1, base));
        if n == 1 {
          let term = match cx.seniority {
            Seniority::Younger => &self.pibling_younger,
            Seniority::Elder | Seniority::Unknown => &self.pibling_elder,
          };
          (RelationshipCode::AuntUncle, english, term.pick(g).to_owned())
        } else {
          let term = self.ancestors.get(n as usize - 1).ok_or_else(unknown)?;
          (RelationshipCode::GrandAuntUncle, english, term.pick(g).to_owned())
        }
      }
      Kinship::Nibling { generations: n } => {
        let base = gendered(g, "nephew", "niece");
        let english = half_prefix(cx.half, &greats(n - 1, base));
        if n == 1 {
          (RelationshipCode::NieceNephew, english, self.nibling.clone())
        } else {
          let term = self.descendants.get(n as usize - 1).ok_or_else(unknown)?;
          (RelationshipCode::GrandNieceNephew, english, term.pick(g).to_owned())
        }
      }
      Kinship::Cousin { degree, removed, elder_line } => {
        if removed > self.max_removed {
          return Err(unknown());
        }
        let term = self.cousins.get(degree as usize - 1).ok_or_else(unknown)?;
        let mut english = format!("{} cousin", ordinal(degree));
        if cx.half {
          english = format!("half {english}");
        }
        if removed > 0 {
          english = format!("{english} {}", removed_phrase(removed));
        }
        let javanese = if removed == 0 {
          term.clone()
        } else {
          let side = if elder_line { "ndhuwur" } else { "ngisor" };
          format!("{term} ({removed} turun {side})")
        };
        (RelationshipCode::Cousin, english, javanese)
      }
    };

    let sapaan = self.sapaan_for(kinship, distance_a, distance_b, cx)?;
    Ok(Label { relationship, label, label_javanese, sapaan: Some(sapaan) })
  }

  /// Labels for a husband or wife, who share no blood line with A.
  pub fn spouse_label(&self, target_gender: Gender) -> Label {
    Label {
      relationship:   RelationshipCode::Spouse,
      label:          gendered(target_gender, "husband", "wife").to_owned(),
      label_javanese: self.spouse.pick(target_gender).to_owned(),
      sapaan:         Some(self.sapaan.spouse.pick(target_gender).to_owned()),
    }
  }

  /// Labels for two people with neither blood nor marriage between them.
  pub fn unrelated(&self) -> Label {
    Label {
      relationship:   RelationshipCode::Unrelated,
      label:          "unrelated".into(),
      label_javanese: "Dudu sedulur".into(),
      sapaan:         None,
    }
  }

  fn sapaan_for(
    &self,
    kinship: Kinship,
    distance_a: u32,
    distance_b: u32,
    cx: &LabelContext,
  ) -> Result<String> {
    let g = cx.target_gender;
    let gap = generation_gap(distance_a, distance_b);
    let s = &self.sapaan;

    let term = match gap {
      ..=-1 => s.junior.pick(g).to_owned(),
      0 => match cx.seniority {
        Seniority::Younger => s.peer_younger.pick(g).to_owned(),
        Seniority::Elder | Seniority::Unknown => s.peer_elder.pick(g).to_owned(),
      },
      1 if kinship.is_collateral() => match cx.seniority {
        Seniority::Younger => self.pibling_younger.pick(g).to_owned(),
        Seniority::Elder | Seniority::Unknown => self.pibling_elder.pick(g).to_owned(),
      },
      1 => self
        .ancestors
        .first()
        .ok_or_else(|| Error::unmapped(distance_a, distance_b))?
        .pick(g)
        .to_owned(),
      2 => s.grandparent.pick(g).to_owned(),
      n => {
        let ancestor = self
          .ancestors
          .get(n as usize - 1)
          .ok_or_else(|| Error::unmapped(distance_a, distance_b))?;
        format!("{} {}", s.elder_prefix, ancestor.pick(g))
      }
    };
    Ok(term)
  }
}

// ─── English helpers ─────────────────────────────────────────────────────────

fn gendered(g: Gender, male: &'static str, female: &'static str) -> &'static str {
  match g {
    Gender::Male => male,
    Gender::Female => female,
  }
}

/// "father", "grandfather", "great-grandfather", …
fn lineal_english(generations: u32, base: &str, grand: &str) -> String {
  match generations {
    1 => base.to_owned(),
    n => greats(n - 2, &format!("{grand}{base}")),
  }
}

fn greats(count: u32, base: &str) -> String {
  format!("{}{base}", "great-".repeat(count as usize))
}

fn half_prefix(half: bool, term: &str) -> String {
  if half { format!("half-{term}") } else { term.to_owned() }
}

fn ordinal(n: u32) -> String {
  const WORDS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth",
    "ninth", "tenth",
  ];
  if let Some(word) = WORDS.get(n as usize - 1) {
    return (*word).to_owned();
  }
  let suffix = match (n % 10, n % 100) {
    (1, r) if r != 11 => "st",
    (2, r) if r != 12 => "nd",
    (3, r) if r != 13 => "rd",
    _ => "th",
  };
  format!("{n}{suffix}")
}

fn removed_phrase(removed: u32) -> String {
  match removed {
    1 => "once removed".into(),
    2 => "twice removed".into(),
    n => format!("{n} times removed"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::UnknownCause;

  fn table() -> LabelTable { LabelTable::default() }

  fn male() -> LabelContext { LabelContext::new(Gender::Male) }

  fn female() -> LabelContext { LabelContext::new(Gender::Female) }

  #[test]
  fn classify_covers_the_fixed_taxonomy() {
    assert_eq!(Kinship::classify(0, 0), Kinship::Myself);
    assert_eq!(Kinship::classify(1, 0), Kinship::Ancestor { generations: 1 });
    assert_eq!(Kinship::classify(0, 1), Kinship::Descendant { generations: 1 });
    assert_eq!(Kinship::classify(1, 1), Kinship::Sibling);
    assert_eq!(Kinship::classify(2, 0), Kinship::Ancestor { generations: 2 });
    assert_eq!(Kinship::classify(0, 2), Kinship::Descendant { generations: 2 });
    assert_eq!(Kinship::classify(2, 1), Kinship::Pibling { generations: 1 });
    assert_eq!(Kinship::classify(1, 2), Kinship::Nibling { generations: 1 });
    assert_eq!(Kinship::classify(2, 2), Kinship::Cousin {
      degree:     1,
      removed:    0,
      elder_line: false,
    });
    assert_eq!(Kinship::classify(5, 3), Kinship::Cousin {
      degree:     2,
      removed:    2,
      elder_line: true,
    });
  }

  #[test]
  fn self_has_no_sapaan() {
    let l = table().label(0, 0, &male()).unwrap();
    assert_eq!(l.relationship, RelationshipCode::Myself);
    assert!(l.sapaan.is_none());
  }

  #[test]
  fn parents_and_children_are_gendered() {
    let t = table();
    let father = t.label(1, 0, &male()).unwrap();
    assert_eq!(father.relationship, RelationshipCode::Parent);
    assert_eq!(father.label, "father");
    assert_eq!(father.label_javanese, "Bapak");
    assert_eq!(father.sapaan.as_deref(), Some("Bapak"));

    let daughter = t.label(0, 1, &female()).unwrap();
    assert_eq!(daughter.relationship, RelationshipCode::Child);
    assert_eq!(daughter.label, "daughter");
    assert_eq!(daughter.label_javanese, "Anak");
    assert_eq!(daughter.sapaan.as_deref(), Some("Nduk"));
  }

  #[test]
  fn distant_lineal_generations_use_greats() {
    let t = table();
    let l = t.label(4, 0, &female()).unwrap();
    assert_eq!(l.relationship, RelationshipCode::GreatGrandparent);
    assert_eq!(l.label, "great-great-grandmother");
    assert_eq!(l.label_javanese, "Canggah");
    assert_eq!(l.sapaan.as_deref(), Some("Mbah Canggah"));

    let l = t.label(0, 3, &male()).unwrap();
    assert_eq!(l.label, "great-grandson");
    assert_eq!(l.label_javanese, "Buyut");
  }

  #[test]
  fn pibling_seniority_picks_pakdhe_or_paklik() {
    let t = table();
    let mut cx = male();
    cx.seniority = Seniority::Elder;
    let elder = t.label(2, 1, &cx).unwrap();
    assert_eq!(elder.relationship, RelationshipCode::AuntUncle);
    assert_eq!(elder.label, "uncle");
    assert_eq!(elder.label_javanese, "Pakdhe");
    assert_eq!(elder.sapaan.as_deref(), Some("Pakdhe"));

    let mut cx = female();
    cx.seniority = Seniority::Younger;
    let younger = t.label(2, 1, &cx).unwrap();
    assert_eq!(younger.label, "aunt");
    assert_eq!(younger.label_javanese, "Bulik");
  }

  #[test]
  fn nibling_is_the_mirror_of_pibling() {
    let l = table().label(1, 2, &female()).unwrap();
    assert_eq!(l.relationship, RelationshipCode::NieceNephew);
    assert_eq!(l.label, "niece");
    assert_eq!(l.label_javanese, "Ponakan");
    assert_eq!(l.sapaan.as_deref(), Some("Nduk"));
  }

  #[test]
  fn grand_aunt_and_grand_nephew() {
    let t = table();
    let l = t.label(3, 1, &female()).unwrap();
    assert_eq!(l.relationship, RelationshipCode::GrandAuntUncle);
    assert_eq!(l.label, "great-aunt");
    assert_eq!(l.label_javanese, "Simbah putri");
    assert_eq!(l.sapaan.as_deref(), Some("Mbah Putri"));

    let l = t.label(1, 3, &male()).unwrap();
    assert_eq!(l.relationship, RelationshipCode::GrandNieceNephew);
    assert_eq!(l.label, "great-nephew");
    assert_eq!(l.label_javanese, "Putu");
  }

  #[test]
  fn cousins_follow_degree_and_removal() {
    let t = table();
    let l = t.label(2, 2, &male()).unwrap();
    assert_eq!(l.relationship, RelationshipCode::Cousin);
    assert_eq!(l.label, "first cousin");
    assert_eq!(l.label_javanese, "Sedulur misan");
    assert_eq!(l.sapaan.as_deref(), Some("Mas"));

    let l = t.label(3, 4, &female()).unwrap();
    assert_eq!(l.label, "second cousin once removed");
    assert_eq!(l.label_javanese, "Sedulur mindho (1 turun ngisor)");
    assert_eq!(l.sapaan.as_deref(), Some("Nduk"));

    let l = t.label(4, 3, &male()).unwrap();
    assert_eq!(l.sapaan.as_deref(), Some("Pakdhe"));
  }

  #[test]
  fn half_siblings_name_the_shared_parent() {
    let mut cx = female();
    cx.half = true;
    cx.shared_parent = Some(Gender::Male);
    cx.seniority = Seniority::Younger;
    let l = table().label(1, 1, &cx).unwrap();
    assert_eq!(l.relationship, RelationshipCode::HalfSibling);
    assert_eq!(l.label, "half-sister");
    assert_eq!(l.label_javanese, "Adhi tunggal bapak");
    assert_eq!(l.sapaan.as_deref(), Some("Dhik"));
  }

  #[test]
  fn unmapped_pairs_are_reported_not_guessed() {
    let t = table();
    assert!(matches!(
      t.label(5, 5, &male()),
      Err(Error::UnknownRelationship(UnknownCause::Unmapped {
        distance_a: 5,
        distance_b: 5,
      }))
    ));
    assert!(matches!(
      t.label(2, 7, &male()),
      Err(Error::UnknownRelationship(_))
    ));
    assert!(matches!(
      t.label(11, 0, &male()),
      Err(Error::UnknownRelationship(_))
    ));
  }

  #[test]
  fn narrower_table_shrinks_coverage() {
    let mut t = table();
    t.cousins.truncate(1);
    assert!(t.label(2, 2, &male()).is_ok());
    assert!(t.label(3, 3, &male()).is_err());
  }

  #[test]
  fn ordinals_past_ten_use_suffixes() {
    assert_eq!(ordinal(11), "11th");
    assert_eq!(ordinal(21), "21st");
    assert_eq!(ordinal(22), "22nd");
    assert_eq!(ordinal(13), "13th");
  }

  #[test]
  fn codes_serialize_in_snake_case() {
    assert_eq!(RelationshipCode::Myself.to_string(), "self");
    assert_eq!(RelationshipCode::GrandAuntUncle.as_ref(), "grand_aunt_uncle");
    assert_eq!(
      serde_json::to_string(&RelationshipCode::HalfSibling).unwrap(),
      "\"half_sibling\""
    );
  }
}
