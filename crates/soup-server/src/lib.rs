//! Wiring for the turtle-soup server: configuration, the top-level router and
//! puzzle ingestion from a directory of markdown files.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use serde::Deserialize;
use soup_core::{Host, ingest, model::ChatModel, store::GameStore};
use soup_llm::LlmConfig;
use thiserror::Error;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SOUP_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  pub llm_base_url:     String,
  pub llm_api_key:      String,
  pub llm_model:        String,
  pub llm_timeout_secs: u64,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             "127.0.0.1".to_owned(),
      port:             8000,
      store_path:       PathBuf::from("soup.db"),
      llm_base_url:     soup_llm::DEFAULT_BASE_URL.to_owned(),
      llm_api_key:      String::new(),
      llm_model:        soup_llm::DEFAULT_MODEL.to_owned(),
      llm_timeout_secs: 120,
    }
  }
}

impl ServerConfig {
  /// Layer `path` (optional) under `SOUP_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SOUP").try_parsing(true))
      .build()?
      .try_deserialize()
  }

  pub fn llm(&self) -> LlmConfig {
    LlmConfig {
      base_url: self.llm_base_url.clone(),
      api_key:  self.llm_api_key.clone(),
      model:    self.llm_model.clone(),
      timeout:  Duration::from_secs(self.llm_timeout_secs),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Mount the JSON API under `/api` with request tracing.
pub fn app<S, M>(host: Arc<Host<S, M>>) -> Router
where
  S: GameStore + 'static,
  M: ChatModel + 'static,
{
  Router::new()
    .nest("/api", soup_api::api_router(host))
    .layer(TraceLayer::new_for_http())
}

// ─── Ingestion ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum IngestError {
  #[error("failed to read {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// What an ingestion run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
  pub created: usize,
  pub updated: usize,
  pub skipped: usize,
}

/// Upsert every `*.md` puzzle in `dir` (not recursive). Files without a
/// surface section are counted as skipped.
pub async fn ingest_dir<S: GameStore>(store: &S, dir: &Path) -> Result<IngestReport, IngestError> {
  let io_err = |path: &Path| {
    let path = path.to_path_buf();
    move |source| IngestError::Io { path, source }
  };

  let mut paths = Vec::new();
  let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err(dir))?;
  while let Some(entry) = entries.next_entry().await.map_err(io_err(dir))? {
    let path = entry.path();
    if path.extension().is_some_and(|ext| ext == "md") {
      paths.push(path);
    }
  }
  paths.sort();

  let mut report = IngestReport::default();
  for path in paths {
    let text = tokio::fs::read_to_string(&path).await.map_err(io_err(&path))?;
    let file_name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let Some(puzzle) = ingest::parse_markdown(&file_name, &text) else {
      tracing::warn!(file = %file_name, "no surface section, skipping");
      report.skipped += 1;
      continue;
    };

    let (stored, created) = store
      .upsert_puzzle(puzzle)
      .await
      .map_err(|e| IngestError::Store(Box::new(e)))?;
    tracing::info!(file = %file_name, title = %stored.title, created, "ingested puzzle");
    if created {
      report.created += 1;
    } else {
      report.updated += 1;
    }
  }
  Ok(report)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
