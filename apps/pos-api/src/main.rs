//! POS API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use samagri_api::{init_tracing, router, AppConfig, AppState, DbDriver};
use samagri_db::{Database, Gateway, MemoryStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(config.env).context("Failed to install tracing subscriber")?;

    info!(
        env = %config.env,
        port = config.port,
        driver = ?config.db_driver,
        "Starting Apana Samagri POS API..."
    );

    let gateway: Arc<dyn Gateway> = match config.db_driver {
        DbDriver::Postgres => {
            let db = Database::new(config.db_config()?)
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!(host = %config.db_host, database = %config.db_name, "Connected to PostgreSQL");
            Arc::new(db)
        }
        DbDriver::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            Arc::new(MemoryStore::with_lock_timeout(config.statement_timeout()))
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(gateway, config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
