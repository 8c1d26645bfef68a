//! Settings resolution.
//!
//! Resolution merges three layers into one [`Settings`] value:
//!
//! 1. compiled-in defaults, written to the store if no record exists yet
//! 2. the stored record, with the `other` host collapsed to the free-form
//!    host and the debug-type map reduced to a set
//! 3. deployment overrides
//!
//! An empty host after all layers falls back to the default preset.
//!
//! A [`SettingsResolver`] memoizes its result. Create one per request, or call
//! [`SettingsResolver::invalidate`] after writing the record.

use std::collections::BTreeSet;
use std::sync::Arc;

use aspireupdate_core::OptionStore;
use parking_lot::Mutex;

use crate::overrides::{DeploymentOverrides, OverrideRegistry};
use crate::repository::SettingsRepository;
use crate::schema::{DebugType, SettingKey, SettingValue, Settings, StoredSettings, DEFAULT_API_HOST};
use crate::ConfigError;

/// Resolves the effective settings for one request.
pub struct SettingsResolver {
    repository: SettingsRepository,
    overrides: Arc<OverrideRegistry>,
    cache: Mutex<Option<Arc<Settings>>>,
}

impl std::fmt::Debug for SettingsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsResolver")
            .field("cached", &self.cache.lock().is_some())
            .finish_non_exhaustive()
    }
}

impl SettingsResolver {
    /// Creates a resolver over `store` and `overrides`.
    pub fn new(store: Arc<dyn OptionStore>, overrides: Arc<OverrideRegistry>) -> Self {
        Self {
            repository: SettingsRepository::new(store),
            overrides,
            cache: Mutex::new(None),
        }
    }

    /// Returns the repository backing this resolver.
    pub fn repository(&self) -> &SettingsRepository {
        &self.repository
    }

    /// Returns the deployment override registry.
    pub fn overrides(&self) -> &Arc<OverrideRegistry> {
        &self.overrides
    }

    /// Returns the effective settings, resolving them on first call.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store cannot be read, or if the defaults
    /// cannot be written when the record is missing.
    pub fn settings(&self) -> Result<Arc<Settings>, ConfigError> {
        let mut cache = self.cache.lock();
        if let Some(settings) = cache.as_ref() {
            return Ok(Arc::clone(settings));
        }

        let (stored, healed) = self.repository.load_or_heal()?;
        let overrides = self.overrides.overrides();
        let (settings, applied) = resolve(&stored, &overrides);
        tracing::debug!(
            healed,
            overrides = ?applied,
            api_host = %settings.api_host,
            enabled = settings.enabled,
            "Resolved settings"
        );

        let settings = Arc::new(settings);
        *cache = Some(Arc::clone(&settings));
        Ok(settings)
    }

    /// Returns one setting by field name.
    ///
    /// Unknown names return `fallback`.
    pub fn get(&self, name: &str, fallback: SettingValue) -> Result<SettingValue, ConfigError> {
        match name.parse::<SettingKey>() {
            Ok(key) => Ok(self.settings()?.get(key)),
            Err(_) => Ok(fallback),
        }
    }

    /// Effective API host.
    pub fn api_host(&self) -> Result<String, ConfigError> {
        Ok(self.settings()?.api_host.clone())
    }

    /// Effective API key.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        Ok(self.settings()?.api_key.clone())
    }

    /// Whether API rewriting is enabled.
    pub fn is_enabled(&self) -> Result<bool, ConfigError> {
        Ok(self.settings()?.enabled)
    }

    /// Whether debug mode is on.
    pub fn debug_enabled(&self) -> Result<bool, ConfigError> {
        Ok(self.settings()?.debug_enabled)
    }

    /// Enabled debug output kinds.
    pub fn debug_types(&self) -> Result<BTreeSet<DebugType>, ConfigError> {
        Ok(self.settings()?.debug_types.clone())
    }

    /// Whether TLS verification is disabled.
    pub fn ssl_verification_disabled(&self) -> Result<bool, ConfigError> {
        Ok(self.settings()?.ssl_verification_disabled)
    }

    /// Drops the memoized result so the next read resolves again.
    pub fn invalidate(&self) {
        *self.cache.lock() = None;
    }
}

/// Resolves `stored` against `overrides`.
///
/// Returns the settings and the names of the overrides that took effect.
pub fn resolve(stored: &StoredSettings, overrides: &DeploymentOverrides) -> (Settings, Vec<&'static str>) {
    let api_host = if stored.uses_other_host() {
        stored.api_host_other.clone()
    } else {
        stored.api_host.clone()
    };

    let mut settings = Settings {
        enabled: stored.enable,
        api_host,
        api_key: stored.api_key.clone(),
        debug_enabled: stored.enable_debug,
        debug_types: stored_debug_types(stored),
        ssl_verification_disabled: stored.disable_ssl_verification,
    };

    let applied = overrides.apply(&mut settings);

    if settings.api_host.trim().is_empty() {
        settings.api_host = DEFAULT_API_HOST.to_string();
    }

    (settings, applied)
}

fn stored_debug_types(stored: &StoredSettings) -> BTreeSet<DebugType> {
    stored
        .enable_debug_type
        .iter()
        .filter(|(_, enabled)| **enabled)
        .filter_map(|(name, _)| match name.parse::<DebugType>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Dropping stored debug type");
                None
            }
        })
        .collect()
}
