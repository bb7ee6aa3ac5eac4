//! Configuration loading and constants.
//!
//! Loads application configuration from an optional TOML file, applies the
//! `PORT` environment override, and validates the result. Every section has
//! defaults, so the service runs with no configuration file at all.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Defaults
// =============================================================================

/// Default bind address
pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default per-dependency readiness check deadline in milliseconds
pub const DEFAULT_CHECK_TIMEOUT_MS: u64 = 2000;

/// Default log filter when neither CLI, RUST_LOG nor config set one
pub const DEFAULT_LOG_FILTER: &str = "pool_maintenance=info,tower_http=info";

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Accepted values for `logging.format`
pub const LOG_FORMATS: [&str; 2] = ["text", "json"];

/// Environment variable overriding `http.port`
pub const PORT_ENV_VAR: &str = "PORT";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Readiness probe settings
    #[serde(default)]
    pub health: HealthConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HTTP_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_HTTP_PORT
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Deadline for each dependency check; expiry counts as a failure
    #[serde(default = "HealthConfig::default_check_timeout_ms")]
    pub check_timeout_ms: u64,
    /// TCP dependencies gating readiness, checked in this order
    #[serde(default)]
    pub dependencies: Vec<DependencyConfig>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_timeout_ms: Self::default_check_timeout_ms(),
            dependencies: Vec::new(),
        }
    }
}

/// A `[[health.dependencies]]` entry: readiness requires `address` to accept
/// TCP connections.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyConfig {
    pub name: String,
    /// `host:port`
    pub address: String,
}

impl HealthConfig {
    fn default_check_timeout_ms() -> u64 {
        DEFAULT_CHECK_TIMEOUT_MS
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
    /// Filter directive, used when neither `--log-level` nor RUST_LOG is set
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
            filter: None,
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }
}

impl AppConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise start from defaults, then apply `PORT`.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_port_override(std::env::var(PORT_ENV_VAR).ok().as_deref())?;
        Ok(config)
    }

    /// Replace `http.port` with an externally supplied value, if any.
    pub fn apply_port_override(&mut self, value: Option<&str>) -> Result<(), ConfigError> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(());
        };
        self.http.port = value.parse().map_err(|_| {
            ConfigError::Validation(format!("{PORT_ENV_VAR} must be a port number, got '{value}'"))
        })?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.health.check_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "health.check_timeout_ms must be greater than zero".to_string(),
            ));
        }
        for dependency in &self.health.dependencies {
            if dependency.name.trim().is_empty() || dependency.address.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "health.dependencies entries need a name and an address".to_string(),
                ));
            }
        }
        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.format must be one of {:?}, got '{}'",
                LOG_FORMATS, self.logging.format
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}
