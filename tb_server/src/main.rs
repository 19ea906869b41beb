//! Tournament bracket server.
//!
//! Serves the bracket REST API over a PostgreSQL or in-memory record store.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use pico_args::Arguments;
use tb_server::{
    api,
    config::{ServerConfig, StoreBackend},
    logging, metrics,
};
use tourney_bracket::{
    TournamentManager,
    db::{Database, MemoryStore, RecordStore},
};
use tracing::info;

const HELP: &str = "\
Run a tournament bracket server

USAGE:
  tb_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:5000]
  --db-url     URL         Database connection string  [default: env DATABASE_URL or postgres://postgres@localhost/brackets]

FLAGS:
  --memory                 Keep records in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  STORE_BACKEND            postgres or memory
  METRICS_ENABLED          Serve /metrics (default: true)
  DB_MAX_CONNECTIONS       Connection pool size
  RUST_LOG                 Log filter (default: info)
";

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        memory: pargs.contains("--memory"),
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.memory)?;
    config.validate()?;

    info!(
        "Starting tournament bracket server at {} ({} store)",
        config.bind, config.store
    );

    let store: Arc<dyn RecordStore> = match config.store {
        StoreBackend::Postgres => {
            let db = Database::new(&config.database)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
            db.migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
            info!("Database connected and migrated");
            Arc::new(db.record_store())
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; records are lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let metrics_handle = if config.metrics_enabled {
        Some(metrics::install_recorder().map_err(Error::msg)?)
    } else {
        None
    };

    let state = api::AppState {
        manager: Arc::new(TournamentManager::new(store)),
        metrics: metrics_handle,
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
