//! Cadence server: configuration and application assembly.
//!
//! The binary in `main.rs` only parses flags, initialises tracing and drives
//! the listener; everything testable lives here.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, bail};
use axum::Router;
use cadence_core::{schedule::Scheduler, session::DEFAULT_PASS_RATIO};
use cadence_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Server configuration, read from the config file and `CADENCE_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  /// SQLite database file. In-memory when unset.
  #[serde(default)]
  pub store_path:         Option<PathBuf>,
  /// Offset of the learner's wall clock from UTC; defines "today".
  #[serde(default)]
  pub utc_offset_minutes: i32,
  /// Score ratio at which a session without an explicit outcome passes.
  #[serde(default = "default_pass_ratio")]
  pub pass_ratio:         f64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_pass_ratio() -> f64 { DEFAULT_PASS_RATIO }

impl ServerConfig {
  /// Layer the optional file at `path` with the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CADENCE").try_parsing(true))
      .build()
      .context("failed to read config file")?;
    Self::from_settings(settings)
  }

  fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
    let cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  fn validate(&self) -> anyhow::Result<()> {
    if !(0.0..=1.0).contains(&self.pass_ratio) {
      bail!("pass_ratio must lie between 0.0 and 1.0, got {}", self.pass_ratio);
    }
    self.scheduler()?;
    Ok(())
  }

  /// The scheduler for the configured wall-clock offset.
  pub fn scheduler(&self) -> anyhow::Result<Scheduler> {
    Scheduler::with_utc_offset_minutes(self.utc_offset_minutes).with_context(|| {
      format!("utc_offset_minutes out of range: {}", self.utc_offset_minutes)
    })
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Open the configured store: a file when `store_path` is set, memory
/// otherwise.
pub async fn open_store(cfg: &ServerConfig) -> anyhow::Result<SqliteStore> {
  let store = match &cfg.store_path {
    Some(path) => {
      let path = expand_tilde(path);
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      info!(path = %path.display(), "store opened");
      store
    }
    None => {
      let store = SqliteStore::open_in_memory()
        .await
        .context("failed to open in-memory store")?;
      info!("in-memory store opened; records are lost on shutdown");
      store
    }
  };
  Ok(store.with_pass_ratio(cfg.pass_ratio))
}

/// The API router wrapped in per-request tracing.
pub fn app(store: SqliteStore, scheduler: Scheduler) -> Router {
  cadence_api::api_router(Arc::new(store), scheduler).layer(TraceLayer::new_for_http())
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
