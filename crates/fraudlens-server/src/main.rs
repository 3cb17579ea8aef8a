//! fraudlens server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), layered
//! under `FRAUDLENS_*` environment variables, opens the SQLite store,
//! and serves the dashboard JSON API over HTTP. The LLM API key comes
//! from `OPENAI_API_KEY` unless the config sets `llm_api_key`.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use fraudlens_bridge::{LlmConfig, OpenAiClient};
use fraudlens_server::{AppState, ServerConfig};
use fraudlens_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "fraudlens dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("FRAUDLENS"))
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let api_key = server_cfg
    .llm_api_key
    .clone()
    .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    .context("no LLM API key: set OPENAI_API_KEY or llm_api_key in config")?;

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", server_cfg.store_path)
    })?;

  let generator = OpenAiClient::new(LlmConfig {
    base_url: server_cfg.llm_base_url.clone(),
    api_key,
    model: server_cfg.llm_model.clone(),
  })
  .context("failed to build completion client")?;

  let state = AppState {
    store:     Arc::new(store),
    generator: Arc::new(generator),
    policy:    server_cfg.policy(),
  };

  let app = fraudlens_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
