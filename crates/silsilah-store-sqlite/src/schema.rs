//! SQL schema for the silsilah SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for later migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Aggregate counts are recomputed by the store on membership changes.
CREATE TABLE IF NOT EXISTS branches (
    branch_id      TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    root_person_id TEXT,
    person_count   INTEGER NOT NULL DEFAULT 0,
    living_count   INTEGER NOT NULL DEFAULT 0,
    spouse_count   INTEGER NOT NULL DEFAULT 0
);

-- branch_id is NULL for external spouses.
CREATE TABLE IF NOT EXISTS persons (
    person_id   TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    nickname    TEXT,
    gender      TEXT NOT NULL,   -- 'male' | 'female'
    is_alive    INTEGER NOT NULL DEFAULT 1,
    generation  INTEGER NOT NULL,
    birth_order INTEGER,
    branch_id   TEXT REFERENCES branches(branch_id),
    photo_url   TEXT,
    birth_date  TEXT,            -- YYYY-MM-DD
    death_date  TEXT,
    created_at  TEXT NOT NULL    -- RFC 3339 UTC
);

CREATE TABLE IF NOT EXISTS marriages (
    marriage_id   TEXT PRIMARY KEY,
    husband_id    TEXT NOT NULL REFERENCES persons(person_id),
    wife_id       TEXT NOT NULL REFERENCES persons(person_id),
    marriage_date TEXT,
    divorce_date  TEXT,
    is_internal   INTEGER NOT NULL,
    is_active     INTEGER NOT NULL,
    CHECK (husband_id != wife_id)
);

CREATE TABLE IF NOT EXISTS parent_child (
    marriage_id TEXT NOT NULL REFERENCES marriages(marriage_id),
    child_id    TEXT NOT NULL REFERENCES persons(person_id),
    birth_order INTEGER NOT NULL,
    PRIMARY KEY (marriage_id, child_id),
    UNIQUE (marriage_id, birth_order)
);

CREATE INDEX IF NOT EXISTS persons_branch_idx    ON persons(branch_id);
CREATE INDEX IF NOT EXISTS marriages_husband_idx ON marriages(husband_id);
CREATE INDEX IF NOT EXISTS marriages_wife_idx    ON marriages(wife_id);
CREATE INDEX IF NOT EXISTS parent_child_child_idx ON parent_child(child_id);

PRAGMA user_version = 1;
";
