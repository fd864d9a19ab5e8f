//! silsilah-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and either serves the kinship API over HTTP or imports a JSON seed
//! document.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use silsilah_core::KinshipEngine;
use silsilah_server::{ServerConfig, expand_tilde};
use silsilah_store_sqlite::{FamilySeed, SqliteStore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Silsilah kinship resolution server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Load a JSON family seed into the store and exit.
  Import {
    /// Seed document with branches, persons, marriages and children.
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Import { file } => {
      let text = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {file:?}"))?;
      let seed = FamilySeed::from_json(&text)
        .with_context(|| format!("failed to parse seed {file:?}"))?;
      let summary = store.import(seed).await.context("import failed")?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Command::Serve => {
      let engine = KinshipEngine::new(Arc::new(store), server_cfg.engine.clone());
      let app = silsilah_server::router(engine);
      let address = format!("{}:{}", server_cfg.host, server_cfg.port);

      tracing::info!(
        max_depth = server_cfg.engine.max_depth,
        max_workers = server_cfg.engine.max_workers,
        "Listening on http://{address}"
      );
      let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;

      axum::serve(listener, app).await.context("server error")?;
    }
  }

  Ok(())
}
