//! [`SqliteStore`], the SQLite implementation of [`FamilyStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use silsilah_core::{
  family::{
    Branch, BranchId, Marriage, MarriageId, NewBranch, NewMarriage, NewPerson, ParentChild,
    Person, PersonId,
  },
  store::{FamilyStore, GraphScope, GraphSnapshot},
};

use crate::{
  Error, Result,
  encode::{
    BRANCH_COLUMNS, MARRIAGE_COLUMNS, PERSON_COLUMNS, RawBranch, RawLink, RawMarriage,
    RawPerson, encode_date, encode_dt, encode_gender, encode_uuid,
  },
  schema::SCHEMA,
  seed::{FamilySeed, ImportSummary},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A family graph backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn exists(&self, sql: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![id_str], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  async fn ensure_person(&self, id: PersonId) -> Result<()> {
    if !self.exists("SELECT 1 FROM persons WHERE person_id = ?1", id).await? {
      return Err(Error::PersonNotFound(id));
    }
    Ok(())
  }

  async fn ensure_branch(&self, id: BranchId) -> Result<()> {
    if !self.exists("SELECT 1 FROM branches WHERE branch_id = ?1", id).await? {
      return Err(Error::BranchNotFound(id));
    }
    Ok(())
  }

  async fn fetch_marriage(&self, id: MarriageId) -> Result<Marriage> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {MARRIAGE_COLUMNS} FROM marriages WHERE marriage_id = ?1"),
              rusqlite::params![id_str],
              RawMarriage::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.ok_or(Error::MarriageNotFound(id))?.into_marriage()
  }

  // ── Writes ─────────────────────────────────────────────────────────────────

  pub async fn add_branch(&self, input: NewBranch) -> Result<Branch> {
    let branch = Branch {
      branch_id:      input.branch_id.unwrap_or_else(Uuid::new_v4),
      name:           input.name,
      root_person_id: input.root_person_id,
      person_count:   0,
      living_count:   0,
      spouse_count:   0,
    };

    let to_insert = branch.clone();
    self
      .conn
      .call(move |conn| {
        insert_branch(conn, &to_insert)?;
        refresh_counts(conn)?;
        Ok(())
      })
      .await?;
    self.get_branch(branch.branch_id).await?.ok_or(Error::BranchNotFound(branch.branch_id))
  }

  /// Add a branch member, or an external spouse when `branch_id` is `None`.
  pub async fn add_person(&self, input: NewPerson) -> Result<Person> {
    if let Some(branch_id) = input.branch_id {
      self.ensure_branch(branch_id).await?;
    }
    let person = person_from_input(input);

    let to_insert = person.clone();
    self
      .conn
      .call(move |conn| {
        insert_person(conn, &to_insert)?;
        refresh_counts(conn)?;
        Ok(())
      })
      .await?;
    Ok(person)
  }

  /// Record a marriage. `is_internal` is derived from both spouses' branches.
  /// Several active marriages per person are allowed.
  pub async fn add_marriage(&self, input: NewMarriage) -> Result<Marriage> {
    if input.husband_id == input.wife_id {
      return Err(Error::InvalidLink(format!(
        "{} cannot be married to themselves",
        input.husband_id
      )));
    }
    self.ensure_person(input.husband_id).await?;
    self.ensure_person(input.wife_id).await?;

    let marriage_id = input.marriage_id.unwrap_or_else(Uuid::new_v4);
    self
      .conn
      .call(move |conn| {
        insert_marriage(conn, marriage_id, &input)?;
        refresh_counts(conn)?;
        Ok(())
      })
      .await?;
    self.fetch_marriage(marriage_id).await
  }

  /// Set the divorce date; the marriage stops being active.
  pub async fn end_marriage(
    &self,
    marriage_id: MarriageId,
    divorce_date: NaiveDate,
  ) -> Result<Marriage> {
    let id_str = encode_uuid(marriage_id);
    let date_str = encode_date(divorce_date);
    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE marriages SET divorce_date = ?2, is_active = 0 WHERE marriage_id = ?1",
          rusqlite::params![id_str, date_str],
        )?)
      })
      .await?;
    if updated == 0 {
      return Err(Error::MarriageNotFound(marriage_id));
    }
    self.fetch_marriage(marriage_id).await
  }

  /// Record a birth or death; branch living counts follow.
  pub async fn set_alive(
    &self,
    person_id: PersonId,
    is_alive: bool,
    death_date: Option<NaiveDate>,
  ) -> Result<Person> {
    let id_str = encode_uuid(person_id);
    let date_str = death_date.filter(|_| !is_alive).map(encode_date);
    let updated = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE persons SET is_alive = ?2, death_date = ?3 WHERE person_id = ?1",
          rusqlite::params![id_str, is_alive, date_str],
        )?;
        refresh_counts(conn)?;
        Ok(n)
      })
      .await?;
    if updated == 0 {
      return Err(Error::PersonNotFound(person_id));
    }
    self.get_person(person_id).await?.ok_or(Error::PersonNotFound(person_id))
  }

  /// Link `child_id` to the marriage of its parents. Without `birth_order`
  /// the child takes the next free position.
  pub async fn add_child(
    &self,
    marriage_id: MarriageId,
    child_id: PersonId,
    birth_order: Option<u32>,
  ) -> Result<ParentChild> {
    let marriage = self.fetch_marriage(marriage_id).await?;
    if marriage.involves(child_id) {
      return Err(Error::InvalidLink(format!(
        "{child_id} cannot be a child of their own marriage"
      )));
    }
    self.ensure_person(child_id).await?;

    let birth_order = self
      .conn
      .call(move |conn| Ok(insert_link(conn, marriage_id, child_id, birth_order)?))
      .await?;
    Ok(ParentChild { marriage_id, child_id, birth_order })
  }

  /// Insert a whole seed document in one transaction.
  pub async fn import(&self, seed: FamilySeed) -> Result<ImportSummary> {
    let summary = ImportSummary {
      branches:  seed.branches.len(),
      persons:   seed.persons.len(),
      marriages: seed.marriages.len(),
      children:  seed.children.len(),
    };

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for input in seed.branches {
          let branch = Branch {
            branch_id:      input.branch_id.unwrap_or_else(Uuid::new_v4),
            name:           input.name,
            root_person_id: input.root_person_id,
            person_count:   0,
            living_count:   0,
            spouse_count:   0,
          };
          insert_branch(&tx, &branch)?;
        }
        for input in seed.persons {
          insert_person(&tx, &person_from_input(input))?;
        }
        for input in seed.marriages {
          let id = input.marriage_id.unwrap_or_else(Uuid::new_v4);
          insert_marriage(&tx, id, &input)?;
        }
        for child in seed.children {
          insert_link(&tx, child.marriage_id, child.child_id, child.birth_order)?;
        }
        refresh_counts(&tx)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      branches = summary.branches,
      persons = summary.persons,
      marriages = summary.marriages,
      children = summary.children,
      "imported family seed"
    );
    Ok(summary)
  }
}

// ─── Row writers ─────────────────────────────────────────────────────────────

fn person_from_input(input: NewPerson) -> Person {
  Person {
    person_id:   input.person_id.unwrap_or_else(Uuid::new_v4),
    full_name:   input.full_name,
    nickname:    input.nickname,
    gender:      input.gender,
    is_alive:    input.is_alive,
    generation:  input.generation,
    birth_order: input.birth_order,
    branch_id:   input.branch_id,
    photo_url:   input.photo_url,
    birth_date:  input.birth_date,
    death_date:  input.death_date,
    created_at:  Utc::now(),
  }
}

fn insert_branch(conn: &rusqlite::Connection, b: &Branch) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO branches (branch_id, name, root_person_id) VALUES (?1, ?2, ?3)",
    rusqlite::params![
      encode_uuid(b.branch_id),
      b.name,
      b.root_person_id.map(encode_uuid),
    ],
  )?;
  Ok(())
}

fn insert_person(conn: &rusqlite::Connection, p: &Person) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO persons ({PERSON_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
    ),
    rusqlite::params![
      encode_uuid(p.person_id),
      p.full_name,
      p.nickname,
      encode_gender(&p.gender),
      p.is_alive,
      p.generation,
      p.birth_order,
      p.branch_id.map(encode_uuid),
      p.photo_url,
      p.birth_date.map(encode_date),
      p.death_date.map(encode_date),
      encode_dt(p.created_at),
    ],
  )?;
  Ok(())
}

fn insert_marriage(
  conn: &rusqlite::Connection,
  marriage_id: MarriageId,
  m: &NewMarriage,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO marriages (
       marriage_id, husband_id, wife_id, marriage_date, divorce_date,
       is_internal, is_active
     ) VALUES (
       ?1, ?2, ?3, ?4, ?5,
       (SELECT COUNT(*) FROM persons
          WHERE person_id IN (?2, ?3) AND branch_id IS NOT NULL) = 2,
       ?5 IS NULL
     )",
    rusqlite::params![
      encode_uuid(marriage_id),
      encode_uuid(m.husband_id),
      encode_uuid(m.wife_id),
      m.marriage_date.map(encode_date),
      m.divorce_date.map(encode_date),
    ],
  )?;
  Ok(())
}

/// Insert a parent-child link and return the birth order it was given.
fn insert_link(
  conn: &rusqlite::Connection,
  marriage_id: MarriageId,
  child_id: PersonId,
  birth_order: Option<u32>,
) -> rusqlite::Result<u32> {
  let marriage_str = encode_uuid(marriage_id);
  let order = match birth_order {
    Some(order) => order,
    None => conn.query_row(
      "SELECT COALESCE(MAX(birth_order), 0) + 1 FROM parent_child WHERE marriage_id = ?1",
      rusqlite::params![marriage_str],
      |r| r.get(0),
    )?,
  };
  conn.execute(
    "INSERT INTO parent_child (marriage_id, child_id, birth_order) VALUES (?1, ?2, ?3)",
    rusqlite::params![marriage_str, encode_uuid(child_id), order],
  )?;
  Ok(order)
}

/// Recompute member, living and external-spouse counts for every branch.
fn refresh_counts(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE branches SET
       person_count = (SELECT COUNT(*) FROM persons p
                         WHERE p.branch_id = branches.branch_id),
       living_count = (SELECT COUNT(*) FROM persons p
                         WHERE p.branch_id = branches.branch_id AND p.is_alive = 1),
       spouse_count = (SELECT COUNT(DISTINCT s.person_id)
                         FROM marriages m
                         JOIN persons member
                           ON member.person_id IN (m.husband_id, m.wife_id)
                         JOIN persons s
                           ON s.person_id IN (m.husband_id, m.wife_id)
                          AND s.person_id != member.person_id
                         WHERE member.branch_id = branches.branch_id
                           AND s.branch_id IS NULL)",
    [],
  )?;
  Ok(())
}

// ─── Scope loading ───────────────────────────────────────────────────────────

/// Members of the branch and every marriage they are party to or born into.
const BRANCH_SCOPE: &str = "
WITH member AS (
  SELECT person_id FROM persons WHERE branch_id = ?1
),
scoped_marriage AS (
  SELECT marriage_id FROM marriages
    WHERE husband_id IN (SELECT person_id FROM member)
       OR wife_id IN (SELECT person_id FROM member)
  UNION
  SELECT marriage_id FROM parent_child
    WHERE child_id IN (SELECT person_id FROM member)
)";

type RawSnapshot = (Vec<RawPerson>, Vec<RawMarriage>, Vec<RawLink>);

fn load_all(conn: &rusqlite::Connection) -> rusqlite::Result<RawSnapshot> {
  let persons = conn
    .prepare(&format!("SELECT {PERSON_COLUMNS} FROM persons ORDER BY person_id"))?
    .query_map([], RawPerson::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let marriages = conn
    .prepare(&format!("SELECT {MARRIAGE_COLUMNS} FROM marriages ORDER BY marriage_id"))?
    .query_map([], RawMarriage::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let links = conn
    .prepare(
      "SELECT marriage_id, child_id, birth_order FROM parent_child
         ORDER BY marriage_id, birth_order",
    )?
    .query_map([], RawLink::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok((persons, marriages, links))
}

fn load_branch(conn: &rusqlite::Connection, branch: &str) -> rusqlite::Result<RawSnapshot> {
  let marriages = conn
    .prepare(&format!(
      "{BRANCH_SCOPE}
       SELECT {MARRIAGE_COLUMNS} FROM marriages
         WHERE marriage_id IN (SELECT marriage_id FROM scoped_marriage)
         ORDER BY marriage_id"
    ))?
    .query_map(rusqlite::params![branch], RawMarriage::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let links = conn
    .prepare(&format!(
      "{BRANCH_SCOPE}
       SELECT marriage_id, child_id, birth_order FROM parent_child
         WHERE marriage_id IN (SELECT marriage_id FROM scoped_marriage)
         ORDER BY marriage_id, birth_order"
    ))?
    .query_map(rusqlite::params![branch], RawLink::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let persons = conn
    .prepare(&format!(
      "{BRANCH_SCOPE}
       SELECT {PERSON_COLUMNS} FROM persons
         WHERE person_id IN (
           SELECT person_id FROM member
           UNION SELECT husband_id FROM marriages
             WHERE marriage_id IN (SELECT marriage_id FROM scoped_marriage)
           UNION SELECT wife_id FROM marriages
             WHERE marriage_id IN (SELECT marriage_id FROM scoped_marriage)
           UNION SELECT child_id FROM parent_child
             WHERE marriage_id IN (SELECT marriage_id FROM scoped_marriage)
         )
         ORDER BY person_id"
    ))?
    .query_map(rusqlite::params![branch], RawPerson::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok((persons, marriages, links))
}

// ─── FamilyStore impl ────────────────────────────────────────────────────────

impl FamilyStore for SqliteStore {
  type Error = Error;

  async fn load_graph_scope(&self, scope: GraphScope) -> Result<GraphSnapshot> {
    if let GraphScope::Branch(id) = scope {
      self.ensure_branch(id).await?;
    }

    let (persons, marriages, links) = self
      .conn
      .call(move |conn| {
        let raw = match scope {
          GraphScope::All => load_all(conn)?,
          GraphScope::Branch(id) => load_branch(conn, &encode_uuid(id))?,
        };
        Ok(raw)
      })
      .await?;

    let snapshot = GraphSnapshot {
      persons:            persons
        .into_iter()
        .map(RawPerson::into_person)
        .collect::<Result<_>>()?,
      marriages:          marriages
        .into_iter()
        .map(RawMarriage::into_marriage)
        .collect::<Result<_>>()?,
      parent_child_links: links
        .into_iter()
        .map(RawLink::into_link)
        .collect::<Result<_>>()?,
    };
    tracing::debug!(
      ?scope,
      persons = snapshot.persons.len(),
      marriages = snapshot.marriages.len(),
      "loaded graph scope from sqlite"
    );
    Ok(snapshot)
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM persons WHERE person_id = ?1"),
              rusqlite::params![id_str],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn get_branch(&self, id: Uuid) -> Result<Option<Branch>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawBranch> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {BRANCH_COLUMNS} FROM branches WHERE branch_id = ?1"),
              rusqlite::params![id_str],
              RawBranch::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawBranch::into_branch).transpose()
  }

  async fn list_branches(&self) -> Result<Vec<Branch>> {
    let raws: Vec<RawBranch> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {BRANCH_COLUMNS} FROM branches ORDER BY name, branch_id"))?;
        let rows = stmt
          .query_map([], RawBranch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBranch::into_branch).collect()
  }
}
