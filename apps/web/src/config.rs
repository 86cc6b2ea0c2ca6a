//! Frontend configuration.
//!
//! Same layering as the API server:
//!
//! ```text
//! struct defaults  →  registrar-web.toml  →  REGISTRAR_WEB_* environment
//! ```
//!
//! `REGISTRAR_WEB_CONFIG` names an explicit file. Example overrides:
//!
//! ```text
//! REGISTRAR_WEB_PORT=5001
//! REGISTRAR_WEB_API__BASE_URL=http://api.internal:8000
//! REGISTRAR_WEB_API__TIMEOUT_SECS=10
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

pub const CONFIG_PATH_ENV: &str = "REGISTRAR_WEB_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "registrar-web.toml";

const ENV_PREFIX: &str = "REGISTRAR_WEB";

/// Frontend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub api: ApiSettings,

    /// Rows per list page
    pub page_size: i64,

    pub log: LogSettings,
}

impl Default for WebConfig {
    fn default() -> Self {
        WebConfig {
            host: "0.0.0.0".to_string(),
            port: 5000,
            api: ApiSettings::default(),
            page_size: 20,
            log: LogSettings::default(),
        }
    }
}

/// Where and how to reach registrar-api.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Logging settings. `RUST_LOG`, when set, overrides `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl WebConfig {
    /// Loads configuration from the default locations and the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_from(path.as_deref(), None)
    }

    /// Loads configuration from an explicit file and environment map.
    pub fn load_from(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: WebConfig = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size < 1 || self.page_size > registrar_core::MAX_PAGE_LIMIT {
            return Err(ConfigError::InvalidValue(format!(
                "page_size {} (must be 1..={})",
                self.page_size,
                registrar_core::MAX_PAGE_LIMIT
            )));
        }
        self.api_base_url()?;
        Ok(())
    }

    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.api.base_url)
            .map_err(|e| ConfigError::InvalidValue(format!("api.base_url {}: {e}", self.api.base_url)))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("host/port {}:{}", self.host, self.port)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
