//! # AspireUpdate
//!
//! **Settings core of the AspireUpdate plugin**
//!
//! AspireUpdate redirects update and catalogue traffic to an alternative API
//! host. This crate family owns its settings:
//!
//! - **Resolution** – defaults, the stored record and deployment overrides
//!   merged into one effective view
//! - **Sanitization** – untrusted form input reduced to a well-formed record
//! - **Reset** – a nonce-protected return to defaults with a one-shot notice
//! - **Deployment overrides** – `AP_*` values pinned by the hosting environment
//!
//! ## Quick Start
//!
//! ```
//! use aspireupdate::prelude::*;
//!
//! let mut config = RuntimeConfig::default();
//! config.store.backend = StoreBackend::Memory;
//!
//! let plugin = AspireUpdate::builder()
//!     .config(config)
//!     .overrides(OverrideRegistry::new(
//!         StaticOverrideSource::new().text(OverrideKey::Host, "mirror.example.org"),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let resolver = plugin.resolver();
//! assert_eq!(resolver.api_host().unwrap(), "mirror.example.org");
//! assert!(!resolver.is_enabled().unwrap());
//! ```
//!
//! ## Request flow
//!
//! ```text
//! admin_init ──► ResetWorkflow ──► Exit(302) ─┐
//!      │                                      │
//!      ▼                                      ▼
//! admin_notices ◄─────────── NotificationGate (once)
//!      │
//!      ▼
//! settings page ──► SettingsPage ──► SettingsForm::submit ──► sanitize ──► store
//! ```

#![doc(html_root_url = "https://docs.rs/aspireupdate/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod plugin;

pub use error::{Error, Result};
pub use plugin::{AspireUpdate, AspireUpdateBuilder};

// Re-export core types
pub use aspireupdate_core as core;

// Re-export settings, overrides and runtime configuration
pub use aspireupdate_config as config;

// Re-export admin workflows
pub use aspireupdate_admin as admin;

// Re-export telemetry
pub use aspireupdate_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```
/// use aspireupdate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{AspireUpdate, AspireUpdateBuilder, Error, Result};

    pub use aspireupdate_core::{
        AdminIdentity, AdminRequest, Capability, HmacNonceService, InMemoryStore, JsonFileStore,
        NonceAction, NonceVerifier, OptionStore, RequestId,
    };

    pub use aspireupdate_config::{
        sanitize, DebugType, DeploymentOverrides, EnvOverrideSource, FileOverrideSource,
        OverrideKey, OverrideRegistry, OverrideSource, RuntimeConfig, RuntimeConfigLoader,
        SettingValue, Settings, SettingsResolver, StaticOverrideSource, StoreBackend,
        StoredSettings,
    };

    pub use aspireupdate_admin::{
        AdminController, AdminHooks, AdminNotice, FieldDescriptor, FieldKind, FieldRenderer,
        Redirect, RequestFlow, SaveOutcome, SettingsPage, SubmenuPage,
    };

    pub use aspireupdate_telemetry::{LogConfig, MetricsConfig};
}
