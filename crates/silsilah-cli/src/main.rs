//! `silsilah` command-line client.
//!
//! Talks to a running silsilah-server over its JSON API and prints results
//! either as plain text or, with `--json`, as the raw response bodies.

mod client;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use silsilah_core::{
  RelationshipResult,
  family::Branch,
  layout::{FamilyTree, TreeNodeKind},
  relationship::RelationshipInfo,
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::client::{AncestorList, ApiClient};

const DEFAULT_URL: &str = "http://localhost:8080";

// ─── Arguments ───────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Query a silsilah kinship server")]
struct Args {
  /// Path to a TOML config file (default: ~/.config/silsilah/cli.toml).
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Server base URL. Overrides the config file.
  #[arg(long, env = "SILSILAH_URL")]
  url: Option<String>,

  /// Print raw JSON instead of text.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// How person B relates to person A.
  Relationship { a: Uuid, b: Uuid },
  /// Resolve one person against many targets.
  Batch {
    person:  Uuid,
    #[arg(required = true)]
    targets: Vec<Uuid>,
  },
  /// Project the family tree, optionally scoped to a branch.
  Tree {
    #[arg(long)]
    branch:      Option<Uuid>,
    /// Label every node relative to this person.
    #[arg(long)]
    relative_to: Option<Uuid>,
  },
  /// List branches with their member counts.
  Branches,
  /// List every ancestor of a person by distance.
  Ancestors { person: Uuid },
}

// ─── Config file ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
  url: Option<String>,
}

fn default_config_path() -> Option<PathBuf> {
  std::env::var_os("HOME")
    .map(|home| PathBuf::from(home).join(".config/silsilah/cli.toml"))
}

fn load_config(path: &Path) -> Result<ConfigFile> {
  if !path.exists() {
    return Ok(ConfigFile::default());
  }
  let text = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {path:?}"))?;
  toml::from_str(&text).with_context(|| format!("failed to parse {path:?}"))
}

/// Flag or env first, then the config file, then the default.
fn resolve_url(flag: Option<String>, file: ConfigFile) -> String {
  flag.or(file.url).unwrap_or_else(|| DEFAULT_URL.to_owned())
}

// ─── Main ────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file = match args.config.clone().or_else(default_config_path) {
    Some(path) => load_config(&path)?,
    None => ConfigFile::default(),
  };
  let client = ApiClient::new(resolve_url(args.url, file))?;

  match args.command {
    Command::Relationship { a, b } => {
      let info = client.relationship(a, b).await?;
      emit(args.json, &info, print_relationship)?;
    }
    Command::Batch { person, targets } => {
      let results = client.relationships(person, &targets).await?;
      emit(args.json, &results, |r| print_batch(r))?;
    }
    Command::Tree { branch, relative_to } => {
      let tree = client.tree(branch, relative_to).await?;
      emit(args.json, &tree, print_tree)?;
    }
    Command::Branches => {
      let branches = client.branches().await?;
      emit(args.json, &branches, |b| print_branches(b))?;
    }
    Command::Ancestors { person } => {
      let list = client.ancestors(person).await?;
      emit(args.json, &list, print_ancestors)?;
    }
  }

  Ok(())
}

fn emit<T: Serialize + ?Sized>(json: bool, value: &T, text: impl Fn(&T)) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(value)?);
  } else {
    text(value);
  }
  Ok(())
}

// ─── Text output ─────────────────────────────────────────────────────────────

fn describe(info: &RelationshipInfo) -> String {
  let mut line = format!("{} ({})", info.label, info.label_javanese);
  if let Some(sapaan) = &info.sapaan {
    line.push_str(&format!(", sapaan {sapaan}"));
  }
  line
}

fn print_relationship(info: &RelationshipInfo) {
  println!("{}", describe(info));
  if !info.path.is_empty() {
    println!("  path: {}", info.path);
  }
  if let (Some(a), Some(b)) = (info.distance_a, info.distance_b) {
    println!("  distance: {a} / {b}");
  }
}

fn print_batch(results: &[RelationshipResult]) {
  for r in results {
    match (&r.relationship, &r.error) {
      (Some(info), _) => println!("{}  {}", r.target, describe(info)),
      (None, Some(err)) => println!("{}  error: {err}", r.target),
      (None, None) => println!("{}  ?", r.target),
    }
  }
}

fn print_tree(tree: &FamilyTree) {
  let mut nodes: Vec<_> = tree.nodes.iter().collect();
  nodes.sort_by_key(|n| (n.rank, n.column));

  let mut rank = None;
  for node in nodes {
    if rank != Some(node.rank) {
      println!("generation {}:", node.rank);
      rank = Some(node.rank);
    }
    let label = node
      .relationship
      .as_ref()
      .map(|l| format!("  [{}]", l.label))
      .unwrap_or_default();
    match &node.kind {
      TreeNodeKind::Person { name, is_alive, .. } => {
        let mark = if *is_alive { "" } else { " †" };
        println!("  {name}{mark}{label}");
      }
      TreeNodeKind::Ghost { name, remote_branch_id, .. } => match remote_branch_id {
        Some(b) => println!("  ({name}, branch {b}){label}"),
        None => println!("  ({name}){label}"),
      },
      TreeNodeKind::Marriage { is_active, .. } => {
        println!("  ═ marriage{}", if *is_active { "" } else { " (ended)" });
      }
    }
  }
}

fn print_branches(branches: &[Branch]) {
  for b in branches {
    println!(
      "{}  {}  members {}  living {}  spouses {}",
      b.branch_id, b.name, b.person_count, b.living_count, b.spouse_count
    );
  }
}

fn print_ancestors(list: &AncestorList) {
  for e in &list.entries {
    println!("{:>3}  {}  via {}", e.distance, e.ancestor_id, e.via);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flag_beats_config_file() {
    let file = ConfigFile { url: Some("http://file:1".into()) };
    assert_eq!(resolve_url(Some("http://flag:2".into()), file), "http://flag:2");
  }

  #[test]
  fn config_file_beats_default() {
    let file: ConfigFile = toml::from_str(r#"url = "http://family.local""#).unwrap();
    assert_eq!(resolve_url(None, file), "http://family.local");
    assert_eq!(resolve_url(None, ConfigFile::default()), DEFAULT_URL);
  }

  #[test]
  fn missing_config_file_is_empty() {
    let cfg = load_config(Path::new("/nonexistent/silsilah/cli.toml")).unwrap();
    assert!(cfg.url.is_none());
  }
}
