//! # Registrar API Server
//!
//! ## Usage
//! ```bash
//! # Defaults: 0.0.0.0:8000, ./registrar.db
//! cargo run -p registrar-api
//!
//! # Different port and database
//! REGISTRAR_PORT=9000 REGISTRAR_DATABASE__PATH=/tmp/registrar.db cargo run -p registrar-api
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use registrar_api::telemetry::init_tracing;
use registrar_api::{router, ApiConfig, AppState};
use registrar_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load().context("loading configuration")?;
    init_tracing(&config.log)?;

    info!("Starting Registrar API v{}", env!("CARGO_PKG_VERSION"));

    let addr = config.bind_addr()?;
    info!(
        %addr,
        database = %config.database.path.display(),
        "Configuration loaded"
    );

    let db_config = DbConfig::new(config.database.path.clone())
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections);
    let db = Database::new(db_config)
        .await
        .context("opening database")?;

    let state = AppState::new(db.clone(), config);
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
