//! `recoup` binary, the debt-collection account backend.
//!
//! Two modes:
//!
//! - `recoup serve [--config config.toml]` serves the JSON API over HTTP.
//!   Configuration comes from the TOML file plus `RECOUP_`-prefixed
//!   environment variables.
//! - `recoup ingest <file> <agency_name> <agency_reference_no>` loads a
//!   delimited account file into the store and print a summary.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use recoup_core::reconcile::{AgencyIdentity, ClientNaming, ingest};
use recoup_csv::RowReader;
use recoup_store_sqlite::SqliteStore;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI ─────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Debt-collection account backend")]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
  },

  /// Ingest a delimited account file on behalf of an agency.
  Ingest {
    /// Path to the CSV file.
    file_path: PathBuf,

    /// Name of the agency.
    agency_name: String,

    /// Reference number of the agency.
    agency_reference_no: String,

    /// Path to the SQLite store.
    #[arg(long, default_value = "recoup.db")]
    store: PathBuf,
  },
}

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `RECOUP_`-prefixed environment variables.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  host:       String,
  port:       u16,
  store_path: PathBuf,
}

fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8000)?
    .set_default("store_path", "recoup.db")?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("RECOUP"))
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  match Cli::parse().command {
    Command::Serve { config } => serve(config).await,
    Command::Ingest {
      file_path,
      agency_name,
      agency_reference_no,
      store,
    } => {
      run_ingest(&file_path, agency_name, agency_reference_no, &store).await
    }
  }
}

async fn serve(config_path: PathBuf) -> anyhow::Result<()> {
  let config = load_config(config_path)?;
  let store_path = expand_tilde(&config.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let app = recoup_api::api_router(Arc::new(store))
    .layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", config.host, config.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn run_ingest(
  file_path: &Path,
  agency_name: String,
  agency_reference_no: String,
  store_path: &Path,
) -> anyhow::Result<()> {
  let store_path = expand_tilde(store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let file = std::fs::File::open(file_path)
    .with_context(|| format!("failed to open {}", file_path.display()))?;
  let rows = RowReader::new(file)
    .with_context(|| format!("invalid header in {}", file_path.display()))?;

  let identity = AgencyIdentity {
    name:         agency_name,
    reference_no: agency_reference_no,
  };

  let summary = ingest(&store, &identity, rows, ClientNaming::ConsumerName)
    .await
    .map_err(|e| anyhow::anyhow!("{e}"))?;

  tracing::info!(
    agency = %identity.reference_no,
    rows = summary.rows_read,
    "csv ingested"
  );
  println!("CSV data ingested successfully");
  println!(
    "  {} account(s) created, {} new client(s), {} new consumer(s){}",
    summary.accounts_created,
    summary.clients_created,
    summary.consumers_created,
    if summary.agency_created {
      ", new agency"
    } else {
      ""
    },
  );

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
