//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings and booleans are 0/1 integers.

use chrono::{DateTime, NaiveDate, Utc};
use silsilah_core::family::{Branch, Gender, Marriage, ParentChild, Person};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Parse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::Parse(e.to_string()))
}

fn decode_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
  s.as_deref().map(decode_date).transpose()
}

// ─── Gender ──────────────────────────────────────────────────────────────────

pub fn encode_gender(g: &Gender) -> &str { g.as_ref() }

pub fn decode_gender(s: &str) -> Result<Gender> {
  s.parse()
    .map_err(|_| Error::Parse(format!("unknown gender: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PERSON_COLUMNS: &str = "person_id, full_name, nickname, gender, is_alive, \
                                  generation, birth_order, branch_id, photo_url, \
                                  birth_date, death_date, created_at";

/// Raw values read directly from a `persons` row.
pub struct RawPerson {
  pub person_id:   String,
  pub full_name:   String,
  pub nickname:    Option<String>,
  pub gender:      String,
  pub is_alive:    bool,
  pub generation:  i32,
  pub birth_order: Option<u32>,
  pub branch_id:   Option<String>,
  pub photo_url:   Option<String>,
  pub birth_date:  Option<String>,
  pub death_date:  Option<String>,
  pub created_at:  String,
}

impl RawPerson {
  /// Read a row selected with [`PERSON_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:   row.get(0)?,
      full_name:   row.get(1)?,
      nickname:    row.get(2)?,
      gender:      row.get(3)?,
      is_alive:    row.get(4)?,
      generation:  row.get(5)?,
      birth_order: row.get(6)?,
      branch_id:   row.get(7)?,
      photo_url:   row.get(8)?,
      birth_date:  row.get(9)?,
      death_date:  row.get(10)?,
      created_at:  row.get(11)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id:   decode_uuid(&self.person_id)?,
      full_name:   self.full_name,
      nickname:    self.nickname,
      gender:      decode_gender(&self.gender)?,
      is_alive:    self.is_alive,
      generation:  self.generation,
      birth_order: self.birth_order,
      branch_id:   decode_opt_uuid(self.branch_id)?,
      photo_url:   self.photo_url,
      birth_date:  decode_opt_date(self.birth_date)?,
      death_date:  decode_opt_date(self.death_date)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const BRANCH_COLUMNS: &str =
  "branch_id, name, root_person_id, person_count, living_count, spouse_count";

pub struct RawBranch {
  pub branch_id:      String,
  pub name:           String,
  pub root_person_id: Option<String>,
  pub person_count:   u32,
  pub living_count:   u32,
  pub spouse_count:   u32,
}

impl RawBranch {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      branch_id:      row.get(0)?,
      name:           row.get(1)?,
      root_person_id: row.get(2)?,
      person_count:   row.get(3)?,
      living_count:   row.get(4)?,
      spouse_count:   row.get(5)?,
    })
  }

  pub fn into_branch(self) -> Result<Branch> {
    Ok(Branch {
      branch_id:      decode_uuid(&self.branch_id)?,
      name:           self.name,
      root_person_id: decode_opt_uuid(self.root_person_id)?,
      person_count:   self.person_count,
      living_count:   self.living_count,
      spouse_count:   self.spouse_count,
    })
  }
}

pub const MARRIAGE_COLUMNS: &str = "marriage_id, husband_id, wife_id, marriage_date, \
                                    divorce_date, is_internal, is_active";

pub struct RawMarriage {
  pub marriage_id:   String,
  pub husband_id:    String,
  pub wife_id:       String,
  pub marriage_date: Option<String>,
  pub divorce_date:  Option<String>,
  pub is_internal:   bool,
  pub is_active:     bool,
}

impl RawMarriage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      marriage_id:   row.get(0)?,
      husband_id:    row.get(1)?,
      wife_id:       row.get(2)?,
      marriage_date: row.get(3)?,
      divorce_date:  row.get(4)?,
      is_internal:   row.get(5)?,
      is_active:     row.get(6)?,
    })
  }

  pub fn into_marriage(self) -> Result<Marriage> {
    Ok(Marriage {
      marriage_id:   decode_uuid(&self.marriage_id)?,
      husband_id:    decode_uuid(&self.husband_id)?,
      wife_id:       decode_uuid(&self.wife_id)?,
      marriage_date: decode_opt_date(self.marriage_date)?,
      divorce_date:  decode_opt_date(self.divorce_date)?,
      is_internal:   self.is_internal,
      is_active:     self.is_active,
    })
  }
}

pub struct RawLink {
  pub marriage_id: String,
  pub child_id:    String,
  pub birth_order: u32,
}

impl RawLink {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      marriage_id: row.get(0)?,
      child_id:    row.get(1)?,
      birth_order: row.get(2)?,
    })
  }

  pub fn into_link(self) -> Result<ParentChild> {
    Ok(ParentChild {
      marriage_id: decode_uuid(&self.marriage_id)?,
      child_id:    decode_uuid(&self.child_id)?,
      birth_order: self.birth_order,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_use_iso_calendar_format() {
    let d = NaiveDate::from_ymd_opt(1945, 8, 17).unwrap();
    assert_eq!(encode_date(d), "1945-08-17");
    assert_eq!(decode_date("1945-08-17").unwrap(), d);
    assert!(decode_date("17/08/1945").is_err());
  }

  #[test]
  fn gender_text_matches_serde_form() {
    assert_eq!(encode_gender(&Gender::Male), "male");
    assert_eq!(encode_gender(&Gender::Female), "female");
    for g in [Gender::Male, Gender::Female] {
      assert_eq!(decode_gender(encode_gender(&g)).unwrap(), g);
      assert_eq!(
        serde_json::to_string(&g).unwrap(),
        format!("\"{}\"", encode_gender(&g))
      );
    }
    assert!(decode_gender("other").is_err());
  }
}
