// crates/server/src/main.rs
//! Back-office server binary.
//!
//! Parses configuration, opens the Postgres pool, and serves the API until
//! Ctrl-C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use backoffice_db::Database;
use backoffice_server::{create_app, init_metrics, AppState, Config};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = Config::parse();
    init_metrics();

    let db = Database::connect(&config.db())
        .await
        .context("failed to connect to Postgres")?;

    let options = config.aggregator();
    tracing::info!(
        schema = %db.schema(),
        lookup_policy = %options.policy,
        deadline_ms = options.deadline.as_millis() as u64,
        "Live session aggregator configured"
    );

    let state = AppState::new(Arc::new(db), options);
    let app = create_app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
