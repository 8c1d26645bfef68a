//! Plugin assembly.

use std::sync::Arc;
use std::time::Duration;

use aspireupdate_admin::{AdminController, AdminUrls};
use aspireupdate_config::{
    EnvOverrideSource, FileOverrideSource, LayeredOverrideSource, OverrideRegistry,
    OverridesConfig, RuntimeConfig, RuntimeConfigLoader, SettingsResolver, StoreBackend,
    DEFAULT_ENV_PREFIX,
};
use aspireupdate_core::{
    CoreError, HmacNonceService, InMemoryStore, JsonFileStore, NonceVerifier, OptionStore,
};
use aspireupdate_telemetry::{LogConfig, MetricsConfig};

use crate::error::Result;

/// An assembled plugin: option store, overrides, nonce service and admin
/// controller wired from one [`RuntimeConfig`].
#[derive(Debug, Clone)]
pub struct AspireUpdate {
    config: RuntimeConfig,
    controller: AdminController,
}

impl AspireUpdate {
    /// Starts a builder.
    pub fn builder() -> AspireUpdateBuilder {
        AspireUpdateBuilder::default()
    }

    /// Loads configuration from `ASPIREUPDATE__*` variables (after reading
    /// `.env`, if present) over the defaults and assembles the plugin against
    /// the process-wide override registry.
    pub fn from_env() -> Result<Self> {
        let config = RuntimeConfigLoader::new()
            .with_defaults()
            .with_dotenv()
            .with_env_prefix(DEFAULT_ENV_PREFIX)
            .load()?;
        Self::builder().config(config).build()
    }

    /// The runtime configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The admin controller.
    pub fn admin(&self) -> &AdminController {
        &self.controller
    }

    /// A resolver for one request.
    pub fn resolver(&self) -> SettingsResolver {
        self.controller.resolver()
    }

    /// Installs logging and metrics as configured.
    pub fn init_telemetry(&self) -> Result<()> {
        let log = LogConfig::from(&self.config.logging);
        aspireupdate_telemetry::init_telemetry(&log, &MetricsConfig::default())?;
        Ok(())
    }
}

/// Builder for [`AspireUpdate`].
///
/// Anything not set explicitly is derived from the runtime configuration.
#[derive(Default)]
#[must_use]
pub struct AspireUpdateBuilder {
    config: Option<RuntimeConfig>,
    store: Option<Arc<dyn OptionStore>>,
    overrides: Option<Arc<OverrideRegistry>>,
    nonces: Option<Arc<dyn NonceVerifier>>,
}

impl std::fmt::Debug for AspireUpdateBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AspireUpdateBuilder")
            .field("config", &self.config)
            .field("store", &self.store.is_some())
            .field("overrides", &self.overrides)
            .field("nonces", &self.nonces.is_some())
            .finish()
    }
}

impl AspireUpdateBuilder {
    /// Uses `config` instead of the defaults.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses the host's option store.
    pub fn store(mut self, store: Arc<dyn OptionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Uses `registry` instead of the process-wide one.
    pub fn overrides(mut self, registry: OverrideRegistry) -> Self {
        self.overrides = Some(Arc::new(registry));
        self
    }

    /// Uses the host's nonce service.
    pub fn nonces(mut self, nonces: Arc<dyn NonceVerifier>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    /// Validates the configuration and wires the plugin.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, the store file or override file
    /// cannot be read, the nonce secret is malformed, or the admin URL is
    /// unusable.
    pub fn build(self) -> Result<AspireUpdate> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => open_store(&config)?,
        };
        let overrides = match self.overrides {
            Some(overrides) => overrides,
            None => global_overrides(&config.overrides)?,
        };
        let nonces = match self.nonces {
            Some(nonces) => nonces,
            None => nonce_service(&config)?,
        };
        let urls = AdminUrls::new(config.admin.base_url.clone())?;

        tracing::debug!(
            backend = ?config.store.backend,
            admin_base = %urls.base(),
            remove_ui = overrides.remove_ui(),
            "AspireUpdate assembled"
        );

        Ok(AspireUpdate {
            controller: AdminController::new(store, overrides, nonces, urls),
            config,
        })
    }
}

fn open_store(config: &RuntimeConfig) -> Result<Arc<dyn OptionStore>> {
    match (&config.store.backend, &config.store.path) {
        (StoreBackend::Memory, _) => Ok(Arc::new(InMemoryStore::new())),
        (StoreBackend::File, Some(path)) => Ok(Arc::new(JsonFileStore::open(path.clone())?)),
        (StoreBackend::File, None) => Err(CoreError::configuration("file store requires a path").into()),
    }
}

/// The environment first, then the optional override file.
pub(crate) fn override_source(config: &OverridesConfig) -> Result<LayeredOverrideSource> {
    let mut env = EnvOverrideSource::new().with_prefix(config.env_prefix.clone());
    if config.dotenv {
        env = env.with_dotenv();
    }
    let mut layered = LayeredOverrideSource::new().then(env);
    if let Some(path) = &config.file {
        layered = layered.then(FileOverrideSource::from_path(path)?);
    }
    Ok(layered)
}

fn global_overrides(config: &OverridesConfig) -> Result<Arc<OverrideRegistry>> {
    let registry = OverrideRegistry::new(override_source(config)?);
    Ok(OverrideRegistry::install_global(registry).unwrap_or_else(|existing| {
        tracing::debug!("Override registry already installed; reusing it");
        existing
    }))
}

fn nonce_service(config: &RuntimeConfig) -> Result<Arc<dyn NonceVerifier>> {
    let service = match &config.nonce.secret {
        Some(secret) => HmacNonceService::from_hex(secret)?,
        None => {
            tracing::warn!("No nonce secret configured; nonces will not survive a restart");
            HmacNonceService::generate()?
        }
    };
    Ok(Arc::new(
        service.with_lifetime(Duration::from_secs(config.nonce.lifetime_secs)),
    ))
}
