//! # Catalog Configuration Module
//!
//! Provides configuration management for the album catalog core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `CatalogConfig` holding the storage location, pool sizing, notification
//! switch and logging settings. Validation is fail-fast: `build()` rejects
//! inconsistent settings before anything touches the database.
//!
//! ## Usage
//!
//! ### Explicit configuration
//!
//! ```ignore
//! use core_runtime::config::CatalogConfig;
//!
//! let config = CatalogConfig::builder()
//!     .database_path("/var/lib/catalog/albums.db")
//!     .max_connections(8)
//!     .notifications_enabled(true)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ### From the environment
//!
//! ```ignore
//! use core_runtime::config::CatalogConfig;
//!
//! // Reads CATALOG_DATABASE_PATH, CATALOG_MAX_CONNECTIONS, ...
//! let config = CatalogConfig::from_env()?;
//! # Ok::<(), core_runtime::Error>(())
//! ```
//!
//! When no database path is configured the catalog runs against an
//! in-memory SQLite database.

use crate::error::{Error, Result};
use crate::logging::{LogFormat, LoggingConfig};
use bridge_traits::LogLevel;
use std::path::PathBuf;

/// Environment variable holding the SQLite database file path
pub const ENV_DATABASE_PATH: &str = "CATALOG_DATABASE_PATH";
/// Environment variable holding the maximum pool size
pub const ENV_MAX_CONNECTIONS: &str = "CATALOG_MAX_CONNECTIONS";
/// Environment variable toggling creation notifications
pub const ENV_NOTIFICATIONS: &str = "CATALOG_NOTIFICATIONS";
/// Environment variable holding the log level
pub const ENV_LOG_LEVEL: &str = "CATALOG_LOG_LEVEL";
/// Environment variable holding the log format
pub const ENV_LOG_FORMAT: &str = "CATALOG_LOG_FORMAT";
/// Environment variable holding a raw `EnvFilter` directive string
pub const ENV_LOG_FILTER: &str = "CATALOG_LOG_FILTER";

const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;
const MAX_CONNECTIONS_LIMIT: u32 = 64;

/// Configuration for the album catalog core.
///
/// Use [`CatalogConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Path to the SQLite database file, `None` for an in-memory database
    pub database_path: Option<PathBuf>,

    /// Minimum number of pooled connections
    pub min_connections: u32,

    /// Maximum number of pooled connections
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,

    /// Send a mail notification after each album creation
    pub notifications_enabled: bool,

    /// Minimum log level for catalog crates
    pub log_level: LogLevel,

    /// Log output format
    pub log_format: LogFormat,

    /// Raw filter directives overriding `log_level`
    pub log_filter: Option<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
            notifications_enabled: true,
            log_level: LogLevel::Info,
            log_format: LogFormat::default(),
            log_filter: None,
        }
    }
}

impl CatalogConfig {
    /// Creates a new builder for constructing a `CatalogConfig`.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Builds a configuration from `CATALOG_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Builds a configuration using `lookup` as the variable source.
    pub fn from_env_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = CatalogConfig::builder();

        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|p| !p.trim().is_empty()) {
            builder = builder.database_path(path);
        }

        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            let max = raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!(
                    "{} must be a positive integer, got '{}'",
                    ENV_MAX_CONNECTIONS, raw
                ))
            })?;
            builder = builder.max_connections(max);
        }

        if let Some(raw) = lookup(ENV_NOTIFICATIONS) {
            builder = builder.notifications_enabled(parse_flag(ENV_NOTIFICATIONS, &raw)?);
        }

        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            let level = raw
                .parse::<LogLevel>()
                .map_err(|e| Error::Config(format!("{}: {}", ENV_LOG_LEVEL, e)))?;
            builder = builder.log_level(level);
        }

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            builder = builder.log_format(raw.parse::<LogFormat>()?);
        }

        if let Some(filter) = lookup(ENV_LOG_FILTER).filter(|f| !f.trim().is_empty()) {
            builder = builder.log_filter(filter);
        }

        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path, when set, is not empty
    /// - Pool bounds are non-zero and ordered
    /// - Acquire timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Database path cannot be empty".to_string()));
            }
        }

        if self.max_connections == 0 {
            return Err(Error::Config(
                "Max connections must be greater than 0".to_string(),
            ));
        }

        if self.max_connections > MAX_CONNECTIONS_LIMIT {
            return Err(Error::Config(format!(
                "Max connections exceeds limit of {}",
                MAX_CONNECTIONS_LIMIT
            )));
        }

        if self.min_connections > self.max_connections {
            return Err(Error::Config(format!(
                "Min connections ({}) cannot exceed max connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        if self.acquire_timeout_secs == 0 {
            return Err(Error::Config(
                "Acquire timeout must be greater than 0 seconds".to_string(),
            ));
        }

        Ok(())
    }

    /// Database location for log output.
    pub fn database_label(&self) -> String {
        self.database_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string())
    }

    /// Logging settings derived from this configuration.
    pub fn logging_config(&self) -> LoggingConfig {
        let config = LoggingConfig::default()
            .with_format(self.log_format)
            .with_level(self.log_level);

        match &self.log_filter {
            Some(filter) => config.with_filter(filter.clone()),
            None => config,
        }
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}

/// Builder for constructing a [`CatalogConfig`].
#[derive(Debug, Default)]
pub struct CatalogConfigBuilder {
    database_path: Option<PathBuf>,
    min_connections: Option<u32>,
    max_connections: Option<u32>,
    acquire_timeout_secs: Option<u64>,
    notifications_enabled: Option<bool>,
    log_level: Option<LogLevel>,
    log_format: Option<LogFormat>,
    log_filter: Option<String>,
}

impl CatalogConfigBuilder {
    /// Sets the SQLite database file path.
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Uses an in-memory database.
    pub fn in_memory(mut self) -> Self {
        self.database_path = None;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = Some(min);
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    pub fn acquire_timeout_secs(mut self, secs: u64) -> Self {
        self.acquire_timeout_secs = Some(secs);
        self
    }

    /// Enables or disables the creation notification mail.
    pub fn notifications_enabled(mut self, enabled: bool) -> Self {
        self.notifications_enabled = Some(enabled);
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    pub fn log_format(mut self, format: LogFormat) -> Self {
        self.log_format = Some(format);
        self
    }

    /// Sets raw `EnvFilter` directives, e.g. `core_catalog=trace,sqlx=info`.
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    /// Builds the configuration, validating it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the resulting configuration is invalid.
    pub fn build(self) -> Result<CatalogConfig> {
        let defaults = CatalogConfig::default();

        let config = CatalogConfig {
            database_path: self.database_path,
            min_connections: self.min_connections.unwrap_or(defaults.min_connections),
            max_connections: self.max_connections.unwrap_or(defaults.max_connections),
            acquire_timeout_secs: self
                .acquire_timeout_secs
                .unwrap_or(defaults.acquire_timeout_secs),
            notifications_enabled: self
                .notifications_enabled
                .unwrap_or(defaults.notifications_enabled),
            log_level: self.log_level.unwrap_or(defaults.log_level),
            log_format: self.log_format.unwrap_or(defaults.log_format),
            log_filter: self.log_filter,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = CatalogConfig::builder().build().unwrap();
        assert_eq!(config.database_path, None);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert!(config.notifications_enabled);
        assert_eq!(config.database_label(), ":memory:");
    }

    #[test]
    fn test_builder_overrides() {
        let config = CatalogConfig::builder()
            .database_path("/tmp/albums.db")
            .min_connections(2)
            .max_connections(10)
            .acquire_timeout_secs(5)
            .notifications_enabled(false)
            .log_level(LogLevel::Debug)
            .log_format(LogFormat::Compact)
            .build()
            .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/albums.db")));
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 5);
        assert!(!config.notifications_enabled);
        assert_eq!(config.database_label(), "/tmp/albums.db");
    }

    #[test]
    fn test_zero_max_connections_rejected() {
        let result = CatalogConfig::builder().max_connections(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_min_above_max_rejected() {
        let err = CatalogConfig::builder()
            .min_connections(8)
            .max_connections(4)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("cannot exceed"));
    }

    #[test]
    fn test_empty_database_path_rejected() {
        let result = CatalogConfig::builder().database_path("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_env() {
        let config = CatalogConfig::from_env_with(env(&[
            (ENV_DATABASE_PATH, "/data/catalog.db"),
            (ENV_MAX_CONNECTIONS, "3"),
            (ENV_NOTIFICATIONS, "off"),
            (ENV_LOG_LEVEL, "warn"),
            (ENV_LOG_FORMAT, "json"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/data/catalog.db")));
        assert_eq!(config.max_connections, 3);
        assert!(!config.notifications_enabled);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_from_env_rejects_garbage() {
        assert!(CatalogConfig::from_env_with(env(&[(ENV_MAX_CONNECTIONS, "many")])).is_err());
        assert!(CatalogConfig::from_env_with(env(&[(ENV_NOTIFICATIONS, "maybe")])).is_err());
        assert!(CatalogConfig::from_env_with(env(&[(ENV_LOG_LEVEL, "loud")])).is_err());
    }

    #[test]
    fn test_logging_config_uses_filter_override() {
        let config = CatalogConfig::builder()
            .log_level(LogLevel::Debug)
            .log_filter("core_catalog=trace")
            .build()
            .unwrap();

        let logging = config.logging_config();
        assert_eq!(logging.level, LogLevel::Debug);
        assert_eq!(logging.filter, Some("core_catalog=trace".to_string()));
    }
}
