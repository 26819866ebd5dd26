//! soup-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `SOUP_*`
//! environment variables, opens the SQLite store and either serves the JSON
//! API or ingests a directory of markdown puzzles.
//!
//! ```text
//! soup-server serve
//! soup-server ingest ./puzzles
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use soup_core::Host;
use soup_llm::OpenAiChat;
use soup_server::{ServerConfig, ingest_dir};
use soup_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Turtle soup game server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (default).
  Serve,
  /// Load every `*.md` puzzle in a directory into the store.
  Ingest {
    /// Directory holding the puzzle files.
    dir: PathBuf,
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

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Ingest { dir } => {
      let report = ingest_dir(&store, &dir)
        .await
        .with_context(|| format!("failed to ingest {dir:?}"))?;
      tracing::info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        "ingestion finished"
      );
      Ok(())
    }
    Command::Serve => serve(server_cfg, store).await,
  }
}

async fn serve(server_cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  if server_cfg.llm_api_key.is_empty() {
    tracing::warn!("no llm_api_key configured; every chat turn will report a configuration error");
  }

  let model = OpenAiChat::new(server_cfg.llm()).context("failed to build model client")?;
  tracing::info!(
    model = %model.config().model,
    base_url = %model.config().base_url,
    "model provider configured"
  );
  let host = Arc::new(Host::new(Arc::new(store), Arc::new(model)));

  let app = soup_server::app(host);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
