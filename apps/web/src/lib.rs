//! # Registrar Web
//!
//! Server-rendered frontend. Every page is built from registrar-api
//! responses; the frontend stores nothing itself.
//!
//! ## Page Flow
//! ```text
//! GET  /students/7          ──► ApiClient::get_student ──► HTML
//! POST /students/7/delete   ──► ApiClient::delete_student
//!                                   │ ok                │ ClientError
//!                                   ▼                   ▼
//!                  303 /students?notice=..   303 back?notice=..&level=error
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod flash;
pub mod pages;
pub mod render;
pub mod telemetry;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use client::ApiClient;
pub use config::WebConfig;
pub use error::{ClientError, ClientResult};

/// Shared frontend state.
pub struct WebState {
    pub api: ApiClient,
    pub config: WebConfig,
}

pub type SharedState = Arc<WebState>;

impl WebState {
    pub fn new(api: ApiClient, config: WebConfig) -> SharedState {
        Arc::new(WebState { api, config })
    }
}

/// Builds the frontend router with request tracing.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .merge(pages::dashboard::router())
        .merge(pages::students::router())
        .merge(pages::courses::router())
        .merge(pages::enrollments::router())
        .fallback(pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
