//! HTTP server wiring for the silsilah kinship engine.
//!
//! Mounts [`silsilah_api::api_router`] under `/api` behind a
//! [`TraceLayer`], over a [`SqliteStore`].

use std::path::{Path, PathBuf};

use axum::Router;
use serde::Deserialize;
use silsilah_core::{EngineConfig, KinshipEngine, store::FamilyStore};
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SILSILAH_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub engine:     EngineConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".into(),
      port:       8080,
      store_path: PathBuf::from("~/.local/share/silsilah/silsilah.db"),
      engine:     EngineConfig::default(),
    }
  }
}

impl ServerConfig {
  /// Layer the optional file at `path` and the environment over the
  /// defaults.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("SILSILAH")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?
      .try_deserialize()
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The full application: API under `/api`, every request traced.
pub fn router<S>(engine: KinshipEngine<S>) -> Router
where
  S: FamilyStore + 'static,
{
  Router::new()
    .nest("/api", silsilah_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use silsilah_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  #[test]
  fn missing_config_file_falls_back_to_defaults() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/silsilah.toml")).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.engine.max_depth, 64);
    assert_eq!(cfg.engine.max_workers, 4);
  }

  #[test]
  fn partial_engine_section_keeps_other_defaults() {
    let cfg: ServerConfig = config::Config::builder()
      .add_source(config::File::from_str(
        "port = 9000\n[engine]\nmax_workers = 2\n[engine.labels]\nmax_removed = 1\n",
        config::FileFormat::Toml,
      ))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.engine.max_workers, 2);
    assert_eq!(cfg.engine.request_timeout_ms, 5000);
    assert_eq!(cfg.engine.labels.max_removed, 1);
    assert_eq!(cfg.engine.labels.sibling, "Sedulur");
  }

  #[test]
  fn tilde_expands_to_home() {
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/family.db")),
        PathBuf::from(home).join("family.db")
      );
    }
    assert_eq!(expand_tilde(Path::new("/tmp/x.db")), PathBuf::from("/tmp/x.db"));
  }

  #[tokio::test]
  async fn api_is_mounted_under_prefix() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let engine = KinshipEngine::new(Arc::new(store), EngineConfig::default());
    let app = router(engine);

    let resp = app
      .clone()
      .oneshot(Request::get("/api/branches").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
      .oneshot(Request::get("/branches").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
