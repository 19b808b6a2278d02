//! # pockethubd: pockethub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and install logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the repositories and the quote client (adapters)
//! - Build the application services and the axum router
//! - Set up every persisted hub and start the poll loop
//! - Serve HTTP until SIGTERM/SIGINT, then stop polling
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use pockethub_adapter_http_axum::state::AppState;
use pockethub_adapter_quotes_reqwest::IngQuoteSource;
use pockethub_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteEntityRepository, SqliteHubRepository,
};
use pockethub_app::event_bus::InProcessEventBus;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).context("parsing log filter")?,
        )
        .init();

    // Database
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("opening database")?;
    let pool = db.pool().clone();

    // Adapters
    let hub_repo = SqliteHubRepository::new(pool.clone());
    let entity_repo = SqliteEntityRepository::new(pool);
    let quotes = Arc::new(
        IngQuoteSource::new(&config.quotes.provider).context("building quote client")?,
    );
    let event_bus = Arc::new(InProcessEventBus::default());

    // Services
    let state = AppState::new(hub_repo, entity_repo, quotes, event_bus);

    let loaded = state.hub_service.setup_all().await?;
    tracing::info!(hubs = loaded, "hubs set up");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh = Arc::clone(&state.refresh_service);
    let interval = config.scan_interval();
    let poller = tokio::spawn(async move { refresh.run_poll_loop(interval, shutdown_rx).await });

    // HTTP
    let app = pockethub_adapter_http_axum::router::build(state);
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, scan_interval = ?interval, "pockethubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down");
    // receiver gone means the poller already stopped
    let _ = shutdown_tx.send(true);
    poller.await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
