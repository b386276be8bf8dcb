//! Configuration module for the monitor
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`WILDGUARD_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use wildguard::config::MonitorConfig;
//!
//! let toml = r#"
//! [backend]
//! url = "http://10.0.0.5:8000"
//! "#;
//! let config: MonitorConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.backend.url, "http://10.0.0.5:8000");
//! assert_eq!(config.refresh.interval_seconds, 30);
//! ```

pub mod backend;
pub mod error;
pub mod logging;

pub use backend::BackendConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};

pub use crate::channel::{BackoffStrategy, ReconnectConfig};
pub use crate::commands::CommandConfig;
pub use crate::refresh::RefreshConfig;
pub use crate::view::BufferConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wildguard.toml";

/// Unified configuration for a monitoring session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Detection service endpoints and timeouts
    pub backend: BackendConfig,
    /// Push channel reconnect policy
    pub reconnect: ReconnectConfig,
    /// Snapshot refresh cadence
    pub refresh: RefreshConfig,
    /// Detection feed capacities
    pub buffers: BufferConfig,
    /// Command timeouts and upload limits
    pub commands: CommandConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports WILDGUARD_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary `WILDGUARD_*` lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WILDGUARD_BACKEND_URL") {
            self.backend.url = url;
        }

        // Logging settings
        if let Some(level) = lookup("WILDGUARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("WILDGUARD_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Some(interval) = lookup("WILDGUARD_REFRESH_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.refresh.interval_seconds = secs;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend.base_url();
        if url.is_empty() {
            return Err(ConfigError::invalid("backend.url", "URL cannot be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "backend.url",
                "URL must start with http:// or https://",
            ));
        }
        if let Some(ws) = &self.backend.ws_url {
            if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
                return Err(ConfigError::invalid(
                    "backend.ws_url",
                    "URL must start with ws:// or wss://",
                ));
            }
        }
        if self.backend.request_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "backend.request_timeout_seconds",
                "timeout must be non-zero",
            ));
        }
        if self.backend.upload_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "backend.upload_timeout_seconds",
                "timeout must be non-zero",
            ));
        }

        if self.reconnect.multiplier < 1.0 {
            return Err(ConfigError::invalid(
                "reconnect.multiplier",
                "multiplier must be at least 1.0",
            ));
        }
        if self.reconnect.connect_timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "reconnect.connect_timeout_seconds",
                "timeout must be non-zero",
            ));
        }

        if self.refresh.interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "refresh.interval_seconds",
                "interval must be non-zero",
            ));
        }
        if self.refresh.history_limit == 0 {
            return Err(ConfigError::invalid(
                "refresh.history_limit",
                "limit must be non-zero",
            ));
        }

        if self.buffers.dashboard_capacity == 0 {
            return Err(ConfigError::invalid(
                "buffers.dashboard_capacity",
                "capacity must be non-zero",
            ));
        }
        if self.buffers.live_capacity == 0 {
            return Err(ConfigError::invalid(
                "buffers.live_capacity",
                "capacity must be non-zero",
            ));
        }

        if self.commands.max_upload_bytes == 0 {
            return Err(ConfigError::invalid(
                "commands.max_upload_bytes",
                "limit must be non-zero",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_monitor_config_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.backend.url, "http://localhost:8000");
        assert_eq!(config.reconnect.delay_ms, 3000);
        assert_eq!(config.refresh.interval_seconds, 30);
        assert_eq!(config.buffers.dashboard_capacity, 10);
        assert_eq!(config.buffers.live_capacity, 5);
        assert_eq!(config.commands.pending_timeout_seconds, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [refresh]
            interval_seconds = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.refresh.interval_seconds, 5);
        assert_eq!(config.refresh.history_limit, 10); // Default
    }

    #[test]
    fn test_config_parse_example_file() {
        let toml = include_str!("../../wildguard.example.toml");
        let config: MonitorConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_load_none_returns_defaults() {
        let config = MonitorConfig::load(None).unwrap();
        assert_eq!(config, MonitorConfig::default());
    }

    #[test]
    fn test_load_missing_file() {
        let err = MonitorConfig::load(Some(Path::new("/nonexistent/wildguard.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wildguard.toml");
        std::fs::write(&path, "[backend\nurl = ").unwrap();
        let err = MonitorConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = MonitorConfig::default().with_overrides_from(lookup(&[
            ("WILDGUARD_BACKEND_URL", "http://sensor-hub:8000"),
            ("WILDGUARD_LOG_LEVEL", "debug"),
            ("WILDGUARD_LOG_FORMAT", "json"),
            ("WILDGUARD_REFRESH_INTERVAL", "12"),
        ]));
        assert_eq!(config.backend.url, "http://sensor-hub:8000");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.refresh.interval_seconds, 12);
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let config = MonitorConfig::default().with_overrides_from(lookup(&[
            ("WILDGUARD_LOG_FORMAT", "xml"),
            ("WILDGUARD_REFRESH_INTERVAL", "soon"),
        ]));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.refresh.interval_seconds, 30);
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = MonitorConfig::default();
        config.backend.url = "localhost:8000".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backend.url"));

        config.backend.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ws_url() {
        let mut config = MonitorConfig::default();
        config.backend.ws_url = Some("http://localhost:8000".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let mut config = MonitorConfig::default();
        config.buffers.live_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.refresh.interval_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shrinking_backoff() {
        let mut config = MonitorConfig::default();
        config.reconnect.multiplier = 0.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reconnect.multiplier"));
    }
}
