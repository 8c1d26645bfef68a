//! Settings schema, resolution and runtime configuration for AspireUpdate.
//!
//! This crate owns everything about the plugin settings record:
//! - The stored shape ([`StoredSettings`]) and the resolved shape ([`Settings`])
//! - Deployment overrides read from the hosting environment ([`OverrideRegistry`])
//! - Resolution of defaults, stored values and overrides ([`SettingsResolver`])
//! - Sanitization of submitted form data ([`sanitize`])
//! - The core's own runtime configuration ([`RuntimeConfig`], [`RuntimeConfigLoader`])
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aspireupdate_config::{OverrideKey, OverrideRegistry, SettingsResolver, StaticOverrideSource};
//! use aspireupdate_core::InMemoryStore;
//!
//! # fn main() -> Result<(), aspireupdate_config::ConfigError> {
//! let overrides = OverrideRegistry::new(
//!     StaticOverrideSource::new().text(OverrideKey::Host, "mirror.example.org"),
//! );
//! let resolver = SettingsResolver::new(Arc::new(InMemoryStore::new()), Arc::new(overrides));
//!
//! assert_eq!(resolver.api_host()?, "mirror.example.org");
//! assert!(!resolver.is_enabled()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Runtime configuration file
//!
//! ```toml
//! [store]
//! backend = "file"
//! path = "/var/lib/aspireupdate/options.json"
//!
//! [nonce]
//! secret = "<64 hex characters>"
//! lifetime_secs = 86400
//!
//! [admin]
//! base_url = "https://example.org/wp-admin/"
//!
//! [overrides]
//! env_prefix = ""
//! file = "/etc/aspireupdate/overrides.toml"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! Every value can be overridden with `ASPIREUPDATE__SECTION__KEY`, for
//! example `ASPIREUPDATE__LOGGING__LEVEL=debug`.

#![doc(html_root_url = "https://docs.rs/aspireupdate-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod loader;
pub mod overrides;
mod repository;
pub mod resolver;
mod runtime;
pub mod sanitize;
pub mod schema;

pub use error::ConfigError;
pub use loader::{RuntimeConfigLoader, DEFAULT_ENV_PREFIX};
pub use overrides::{
    DeploymentOverrides, EnvOverrideSource, FileOverrideSource, LayeredOverrideSource,
    OverrideKey, OverrideRegistry, OverrideSource, RawOverride, StaticOverrideSource,
};
pub use repository::SettingsRepository;
pub use resolver::SettingsResolver;
pub use runtime::*;
pub use sanitize::sanitize;
pub use schema::{
    DebugType, HostPreset, SettingKey, SettingValue, Settings, StoredSettings, DEFAULT_API_HOST,
    HOST_PRESETS, OTHER_HOST, RESET_NOTICE_OPTION, SETTINGS_OPTION,
};
