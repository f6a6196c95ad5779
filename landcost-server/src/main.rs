use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use landcost_core::db::DbConfig;
use landcost_server::{app, logging};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Land-acquisition cost estimate server.
///
/// Opens the configured store, seeds the catalog rows on first use and
/// serves the estimate tables over HTTP.
#[derive(Debug, Parser)]
struct Cli {
    /// Storage backend to use (`sqlite` or `memory`).
    #[arg(long, env = "LANDCOST_BACKEND", default_value = "sqlite")]
    backend: String,

    /// Backend connection string.
    /// For SQLite this is a file path (e.g. `landcost.db`) or `:memory:`.
    #[arg(long, env = "LANDCOST_DB", default_value = "landcost.db")]
    db: String,

    /// Address to listen on.
    #[arg(long, env = "LANDCOST_BIND", default_value = "127.0.0.1:3033")]
    bind: String,

    /// Also append log records to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter directive; overrides `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

async fn shutdown_signal() {
    let result = tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c");
    logging::log_task_error("shutdown_signal", result);
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref())?;
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let db_config = DbConfig::new(cli.backend, cli.db);
    let state = app::AppState::open(&db_config).await?;
    let router = app::create_router(state);

    let listener = TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;
    info!("Listening on http://{}", cli.bind);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
