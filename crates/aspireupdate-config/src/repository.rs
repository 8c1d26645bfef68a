//! Typed access to the stored settings record.

use std::sync::Arc;

use aspireupdate_core::OptionStore;

use crate::schema::{StoredSettings, SETTINGS_OPTION};
use crate::ConfigError;

/// Reads and writes [`StoredSettings`] under [`SETTINGS_OPTION`].
#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<dyn OptionStore>,
}

impl std::fmt::Debug for SettingsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsRepository")
            .field("option", &SETTINGS_OPTION)
            .finish_non_exhaustive()
    }
}

impl SettingsRepository {
    /// Creates a repository over `store`.
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying option store.
    pub fn store(&self) -> &Arc<dyn OptionStore> {
        &self.store
    }

    /// Reads the stored record, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the store fails or the record cannot be decoded.
    pub fn load(&self) -> Result<Option<StoredSettings>, ConfigError> {
        match self.store.get(SETTINGS_OPTION)? {
            Some(value) => Ok(Some(StoredSettings::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Reads the stored record, writing the defaults first if it is absent.
    ///
    /// The second flag is `true` when the defaults were written by this call.
    pub fn load_or_heal(&self) -> Result<(StoredSettings, bool), ConfigError> {
        if let Some(stored) = self.load()? {
            return Ok((stored, false));
        }
        let defaults = StoredSettings::defaults();
        self.save(&defaults)?;
        tracing::info!(option = SETTINGS_OPTION, "Settings record missing; wrote defaults");
        Ok((defaults, true))
    }

    /// Replaces the stored record.
    pub fn save(&self, settings: &StoredSettings) -> Result<(), ConfigError> {
        self.store.set(SETTINGS_OPTION, settings.to_value()?)?;
        Ok(())
    }

    /// Overwrites the stored record with the defaults and returns them.
    pub fn reset_to_defaults(&self) -> Result<StoredSettings, ConfigError> {
        let defaults = StoredSettings::defaults();
        self.save(&defaults)?;
        Ok(defaults)
    }
}
