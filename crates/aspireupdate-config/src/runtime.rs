//! Runtime configuration of the settings core itself.
//!
//! These values describe how the core is wired into its host: where options
//! are persisted, the nonce secret, the admin URL, where deployment overrides
//! come from, and how logs are written. They are distinct from the plugin
//! settings an administrator edits.

use std::path::PathBuf;

use aspireupdate_core::nonce::MIN_SECRET_LEN;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Complete runtime configuration.
///
/// # Example
///
/// ```
/// use aspireupdate_config::{RuntimeConfig, StoreBackend};
///
/// let config = RuntimeConfig::default();
/// assert_eq!(config.store.backend, StoreBackend::File);
/// assert_eq!(config.admin.base_url, "/wp-admin/");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Option store.
    #[serde(default)]
    pub store: StoreConfig,

    /// Nonce service.
    #[serde(default)]
    pub nonce: NonceConfig,

    /// Admin page URLs.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Deployment override sources.
    #[serde(default)]
    pub overrides: OverridesConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Development preset: in-memory store, pretty debug logs.
    #[must_use]
    pub fn development() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Memory,
                path: None,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: LogFormat::Pretty,
                ansi_enabled: true,
                ..LoggingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Production preset: file store, JSON logs.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LoggingConfig {
                format: LogFormat::Json,
                ..LoggingConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - the file store has no path
    /// - the nonce lifetime is shorter than two seconds
    /// - the nonce secret is not an even-length hex string of at least
    ///   [`MIN_SECRET_LEN`] bytes
    /// - the admin base URL is empty or lacks a trailing slash
    /// - the log level is unknown
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::File && self.store.path.is_none() {
            return Err(ConfigError::invalid_value(
                "store.path",
                "required when store.backend is \"file\"",
            ));
        }

        if self.nonce.lifetime_secs < 2 {
            return Err(ConfigError::invalid_value(
                "nonce.lifetime_secs",
                "must be at least 2",
            ));
        }

        if let Some(secret) = &self.nonce.secret {
            let secret = secret.trim();
            if !secret.chars().all(|c| c.is_ascii_hexdigit()) || secret.len() % 2 != 0 {
                return Err(ConfigError::invalid_value(
                    "nonce.secret",
                    "must be a hex string of whole bytes",
                ));
            }
            if secret.len() < MIN_SECRET_LEN * 2 {
                return Err(ConfigError::invalid_value(
                    "nonce.secret",
                    format!("must be at least {MIN_SECRET_LEN} bytes ({} hex characters)", MIN_SECRET_LEN * 2),
                ));
            }
        }

        if self.admin.base_url.is_empty() || !self.admin.base_url.ends_with('/') {
            return Err(ConfigError::invalid_value(
                "admin.base_url",
                format!("must end with '/': {:?}", self.admin.base_url),
            ));
        }

        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("unknown level: {}", self.logging.level),
            ));
        }

        Ok(())
    }
}

/// Option store backends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local map; nothing survives a restart.
    Memory,
    /// One JSON document on disk.
    #[default]
    File,
}

/// Option store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend.
    #[serde(default)]
    pub backend: StoreBackend,

    /// Path of the JSON document for the file backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: Some(PathBuf::from("aspireupdate-options.json")),
        }
    }
}

/// Nonce service configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NonceConfig {
    /// Hex-encoded HMAC secret; a random one is generated per process when unset.
    #[serde(default)]
    pub secret: Option<String>,

    /// Nonce lifetime in seconds.
    #[serde(default = "default_nonce_lifetime")]
    pub lifetime_secs: u64,
}

impl std::fmt::Debug for NonceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("lifetime_secs", &self.lifetime_secs)
            .finish()
    }
}

impl Default for NonceConfig {
    fn default() -> Self {
        Self {
            secret: None,
            lifetime_secs: default_nonce_lifetime(),
        }
    }
}

fn default_nonce_lifetime() -> u64 {
    24 * 60 * 60
}

/// Admin URL configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Base URL of the admin area; settings page links are built under it.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "/wp-admin/".to_string()
}

/// Deployment override source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct OverridesConfig {
    /// Prefix for `AP_*` environment variables.
    #[serde(default)]
    pub env_prefix: String,

    /// Optional TOML file of `AP_*` constants, consulted after the environment.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Load a `.env` file before reading the environment.
    #[serde(default)]
    pub dotenv: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        RuntimeConfig::default().validate().unwrap();
        RuntimeConfig::development().validate().unwrap();
        RuntimeConfig::production().validate().unwrap();
    }

    #[test]
    fn test_development_preset() {
        let config = RuntimeConfig::development();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_file_store_requires_path() {
        let mut config = RuntimeConfig::default();
        config.store.path = None;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("store.path"));
    }

    #[test]
    fn test_rejects_short_lifetime() {
        let mut config = RuntimeConfig::default();
        config.nonce.lifetime_secs = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_hex_secret() {
        let mut config = RuntimeConfig::default();
        config.nonce.secret = Some("not hex!".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_must_be_whole_bytes_of_sufficient_length() {
        let mut config = RuntimeConfig::default();
        for secret in ["", "abc", "00ff", &"ab".repeat(31), &format!("{}a", "ab".repeat(32))] {
            config.nonce.secret = Some(secret.to_string());
            assert!(config.validate().is_err(), "accepted {secret:?}");
        }

        config.nonce.secret = Some("ab".repeat(32));
        assert!(config.validate().is_ok());
        config.nonce.secret = Some("AB".repeat(40));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_base_url_without_slash() {
        let mut config = RuntimeConfig::default();
        config.admin.base_url = "https://example.org/wp-admin".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_level() {
        let mut config = RuntimeConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = NonceConfig {
            secret: Some("deadbeef".to_string()),
            ..NonceConfig::default()
        };
        assert!(!format!("{config:?}").contains("deadbeef"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<RuntimeConfig, _> = toml::from_str("[store]\nbogus = 1\n");
        assert!(result.is_err());
    }
}
