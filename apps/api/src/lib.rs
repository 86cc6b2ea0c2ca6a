//! # Registrar API
//!
//! JSON REST server over the registrar database.
//!
//! ## Request Flow
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────────┐   ┌──────────────────┐
//! │  Client  │──►│ CORS/Trace │──►│ Route handler │──►│ registrar-db     │
//! │ (web UI) │   │ (tower)    │   │ (routes/*)    │   │ repository call  │
//! └──────────┘   └────────────┘   └───────┬───────┘   └────────┬─────────┘
//!                                         │    DbError         │
//!                                         ◄────────────────────┘
//!                                         ▼
//!                                  ApiError → {"detail": ...}
//! ```
//!
//! Handlers stay thin: validation and rule checks live in the repositories,
//! so a handler is extract, call, wrap.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use registrar_db::Database;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ApiConfig,
}

/// State handle passed to every handler.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> SharedState {
        Arc::new(AppState { db, config })
    }
}

/// Builds the full router with middleware.
pub fn router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .merge(routes::system::router())
        .merge(routes::students::router())
        .merge(routes::courses::router())
        .merge(routes::enrollments::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured origins. Unparseable origins are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
