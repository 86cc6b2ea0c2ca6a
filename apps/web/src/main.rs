//! # Registrar Web Server
//!
//! ## Usage
//! ```bash
//! # Defaults: 0.0.0.0:5000, API at http://localhost:8000
//! cargo run -p registrar-web
//!
//! # Point at another API
//! REGISTRAR_WEB_API__BASE_URL=http://api.internal:8000 cargo run -p registrar-web
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use registrar_web::telemetry::init_tracing;
use registrar_web::{router, ApiClient, WebConfig, WebState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WebConfig::load().context("loading configuration")?;
    init_tracing(&config.log)?;

    info!("Starting Registrar Web v{}", env!("CARGO_PKG_VERSION"));

    let addr = config.bind_addr()?;
    let api = ApiClient::new(config.api_base_url()?, config.api.timeout())
        .context("building HTTP client")?;
    info!(
        %addr,
        api = %api.base_url(),
        timeout_secs = config.api.timeout_secs,
        "Configuration loaded"
    );

    let app = router(WebState::new(api, config));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "Frontend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

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
