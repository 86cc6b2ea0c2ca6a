//! API server configuration.
//!
//! Settings are layered, later layers winning:
//!
//! ```text
//! struct defaults  →  TOML file  →  REGISTRAR_* environment variables
//! ```
//!
//! The file is `registrar-api.toml` in the working directory (optional), or
//! the path named by `REGISTRAR_CONFIG` (required to exist). Nested keys use
//! `__` in variable names and lists are comma-separated:
//!
//! ```text
//! REGISTRAR_PORT=9000
//! REGISTRAR_DATABASE__PATH=/var/lib/registrar/registrar.db
//! REGISTRAR_CORS_ORIGINS=http://localhost:5000,http://127.0.0.1:5000
//! REGISTRAR_LOG__FORMAT=json
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "REGISTRAR_CONFIG";

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "registrar-api.toml";

const ENV_PREFIX: &str = "REGISTRAR";

/// API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// HTTP port
    pub port: u16,

    pub database: DatabaseSettings,

    /// Origins allowed to call the API from a browser
    pub cors_origins: Vec<String>,

    pub log: LogSettings,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database: DatabaseSettings::default(),
            cors_origins: vec![
                "http://localhost:5000".to_string(),
                "http://localhost:5001".to_string(),
                "http://127.0.0.1:5000".to_string(),
                "http://127.0.0.1:5001".to_string(),
            ],
            log: LogSettings::default(),
        }
    }
}

/// SQLite settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file, or `:memory:`
    pub path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("registrar.db"),
            max_connections: 5,
            min_connections: 1,
        }
    }
}

/// Logging settings. `RUST_LOG`, when set, overrides `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// An `EnvFilter` directive such as `info` or `registrar_db=debug,info`
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

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl ApiConfig {
    /// Loads configuration from the default file locations and the process
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_from(path.as_deref(), None)
    }

    /// Loads configuration from an explicit file and environment.
    ///
    /// `env` replaces the process environment when given (used by tests).
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
            .list_separator(",")
            .with_list_parse_key("cors_origins")
            .source(env);

        let config = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize::<ApiConfig>()?;

        Ok(config)
    }

    /// Socket address built from `host` and `port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("host/port {}:{}", self.host, self.port)))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = ApiConfig::load_from(None, env(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_file_then_env_override() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
            port = 9000
            cors_origins = ["http://frontend.local"]

            [database]
            path = "/tmp/from-file.db"

            [log]
            format = "json"
            "#
        )
        .unwrap();

        let config = ApiConfig::load_from(
            Some(file.path()),
            env(&[
                ("REGISTRAR_PORT", "9100"),
                ("REGISTRAR_DATABASE__MAX_CONNECTIONS", "12"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.database.path, PathBuf::from("/tmp/from-file.db"));
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.cors_origins, ["http://frontend.local"]);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_env_list_parsing() {
        let config = ApiConfig::load_from(
            None,
            env(&[("REGISTRAR_CORS_ORIGINS", "http://a.test,http://b.test")]),
        )
        .unwrap();
        assert_eq!(config.cors_origins, ["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = ApiConfig::load_from(Some(Path::new("/nonexistent/registrar.toml")), env(&[]));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let config = ApiConfig {
            host: "not a host".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.bind_addr().is_err());
    }
}
