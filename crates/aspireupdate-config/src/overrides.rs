//! Deployment overrides.
//!
//! Operators can pin settings from the hosting environment, ahead of anything
//! an administrator saved. Seven names are recognized:
//!
//! | Name | Kind | Effect |
//! |------|------|--------|
//! | `AP_ENABLE` | flag | forces `enabled` on |
//! | `AP_HOST` | text | replaces the API host |
//! | `AP_API_KEY` | text | replaces the API key |
//! | `AP_DEBUG` | flag | forces debug mode on |
//! | `AP_DEBUG_TYPES` | list | replaces the debug types when non-empty |
//! | `AP_DISABLE_SSL` | flag | forces TLS verification off |
//! | `AP_REMOVE_UI` | flag | hides the settings page |
//!
//! Flags only ever force `true`. An unset flag and a flag set to `false` are
//! indistinguishable to the resolver, so a deployment cannot force a feature
//! off that an administrator turned on.
//!
//! Each name is looked up at most once per [`OverrideRegistry`]. The first
//! lookup freezes the value, supplied or not, for the registry's lifetime; the
//! process-wide registry from [`OverrideRegistry::global`] therefore needs a
//! restart to pick up a changed environment.
//!
//! # Example
//!
//! ```
//! use aspireupdate_config::{OverrideKey, OverrideRegistry, StaticOverrideSource};
//!
//! let registry = OverrideRegistry::new(
//!     StaticOverrideSource::new()
//!         .text(OverrideKey::Host, "mirror.example.org")
//!         .flag(OverrideKey::Enable, true),
//! );
//!
//! let overrides = registry.overrides();
//! assert_eq!(overrides.api_host.as_deref(), Some("mirror.example.org"));
//! assert!(overrides.enable);
//! assert!(!overrides.debug);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use crate::loader::parse_bool;
use crate::schema::{DebugType, Settings};
use crate::ConfigError;

/// A recognized deployment override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverrideKey {
    /// `AP_ENABLE`
    Enable,
    /// `AP_HOST`
    Host,
    /// `AP_API_KEY`
    ApiKey,
    /// `AP_DEBUG`
    Debug,
    /// `AP_DEBUG_TYPES`
    DebugTypes,
    /// `AP_DISABLE_SSL`
    DisableSsl,
    /// `AP_REMOVE_UI`
    RemoveUi,
}

/// How an override value is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideKind {
    /// A boolean that can only force `true`.
    Flag,
    /// A string that replaces the stored value.
    Text,
    /// A list of names.
    List,
}

impl OverrideKey {
    /// All keys.
    pub const ALL: [Self; 7] = [
        Self::Enable,
        Self::Host,
        Self::ApiKey,
        Self::Debug,
        Self::DebugTypes,
        Self::DisableSsl,
        Self::RemoveUi,
    ];

    /// Returns the environment name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Enable => "AP_ENABLE",
            Self::Host => "AP_HOST",
            Self::ApiKey => "AP_API_KEY",
            Self::Debug => "AP_DEBUG",
            Self::DebugTypes => "AP_DEBUG_TYPES",
            Self::DisableSsl => "AP_DISABLE_SSL",
            Self::RemoveUi => "AP_REMOVE_UI",
        }
    }

    /// Returns how the value is typed.
    #[must_use]
    pub const fn kind(&self) -> OverrideKind {
        match self {
            Self::Host | Self::ApiKey => OverrideKind::Text,
            Self::DebugTypes => OverrideKind::List,
            Self::Enable | Self::Debug | Self::DisableSsl | Self::RemoveUi => OverrideKind::Flag,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }

    /// Looks a key up by its environment name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }
}

impl fmt::Display for OverrideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An override value as the environment supplies it, before typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOverride {
    /// A native boolean.
    Bool(bool),
    /// A string; environment variables always arrive as this.
    Text(String),
    /// A native list of strings.
    List(Vec<String>),
}

/// A typed override value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideValue {
    /// Flag value.
    Flag(bool),
    /// Text value.
    Text(String),
    /// List value, trimmed with empty entries removed.
    List(Vec<String>),
}

impl OverrideValue {
    fn inert(kind: OverrideKind) -> Self {
        match kind {
            OverrideKind::Flag => Self::Flag(false),
            OverrideKind::Text => Self::Text(String::new()),
            OverrideKind::List => Self::List(Vec::new()),
        }
    }
}

/// The frozen state of one override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideSlot {
    /// The typed value; the inert default when not supplied.
    pub value: OverrideValue,
    /// Whether the environment supplied the value.
    pub supplied: bool,
}

impl OverrideSlot {
    fn inert(key: OverrideKey) -> Self {
        Self {
            value: OverrideValue::inert(key.kind()),
            supplied: false,
        }
    }

    /// Returns `true` if this is a supplied flag set to `true`.
    #[must_use]
    pub fn forces_on(&self) -> bool {
        self.supplied && self.value == OverrideValue::Flag(true)
    }

    /// Returns the supplied text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match (&self.value, self.supplied) {
            (OverrideValue::Text(text), true) => Some(text),
            _ => None,
        }
    }

    /// Returns the supplied list when it is non-empty.
    #[must_use]
    pub fn non_empty_list(&self) -> Option<&[String]> {
        match (&self.value, self.supplied) {
            (OverrideValue::List(items), true) if !items.is_empty() => Some(items),
            _ => None,
        }
    }
}

/// Where deployment overrides come from.
pub trait OverrideSource: Send + Sync {
    /// Returns the value for `key` if the environment defines it.
    fn lookup(&self, key: OverrideKey) -> Option<RawOverride>;
}

/// Reads overrides from process environment variables.
///
/// Variable names are the override names, optionally prefixed
/// (`MYSITE_AP_HOST` with prefix `MYSITE_`).
#[derive(Debug, Clone, Default)]
pub struct EnvOverrideSource {
    prefix: String,
}

impl EnvOverrideSource {
    /// Creates a source reading unprefixed variables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a prefix prepended to every variable name.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Loads a `.env` file into the process environment first.
    ///
    /// A missing `.env` file is not an error.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        self
    }
}

impl OverrideSource for EnvOverrideSource {
    fn lookup(&self, key: OverrideKey) -> Option<RawOverride> {
        let var = format!("{}{}", self.prefix, key.name());
        match env::var(&var) {
            Ok(value) => Some(RawOverride::Text(value)),
            Err(env::VarError::NotPresent) => None,
            Err(env::VarError::NotUnicode(_)) => {
                tracing::warn!(var = %var, "Ignoring non-UTF-8 override");
                None
            }
        }
    }
}

/// Reads overrides from a TOML file of top-level constants.
///
/// ```toml
/// AP_ENABLE = true
/// AP_HOST = "mirror.example.org"
/// AP_DEBUG_TYPES = ["request", "response"]
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileOverrideSource {
    values: BTreeMap<String, toml::Value>,
}

impl FileOverrideSource {
    /// Loads overrides from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable, or not TOML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Parses overrides from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let values: BTreeMap<String, toml::Value> = toml::from_str(content)?;
        for name in values.keys() {
            if OverrideKey::from_name(name).is_none() {
                tracing::warn!(name = %name, "Ignoring unknown override in file");
            }
        }
        Ok(Self { values })
    }
}

impl OverrideSource for FileOverrideSource {
    fn lookup(&self, key: OverrideKey) -> Option<RawOverride> {
        match self.values.get(key.name())? {
            toml::Value::Boolean(b) => Some(RawOverride::Bool(*b)),
            toml::Value::String(s) => Some(RawOverride::Text(s.clone())),
            toml::Value::Integer(i) => Some(match key.kind() {
                OverrideKind::Flag => RawOverride::Bool(*i != 0),
                OverrideKind::Text | OverrideKind::List => RawOverride::Text(i.to_string()),
            }),
            toml::Value::Array(items) => Some(RawOverride::List(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            )),
            other => {
                tracing::warn!(
                    name = key.name(),
                    kind = other.type_str(),
                    "Ignoring override of unsupported type"
                );
                None
            }
        }
    }
}

/// Overrides held in memory, for embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticOverrideSource {
    values: HashMap<OverrideKey, RawOverride>,
}

impl StaticOverrideSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines `key` with a raw value.
    #[must_use]
    pub fn with(mut self, key: OverrideKey, value: RawOverride) -> Self {
        self.values.insert(key, value);
        self
    }

    /// Defines a flag.
    #[must_use]
    pub fn flag(self, key: OverrideKey, value: bool) -> Self {
        self.with(key, RawOverride::Bool(value))
    }

    /// Defines a text value.
    #[must_use]
    pub fn text(self, key: OverrideKey, value: impl Into<String>) -> Self {
        self.with(key, RawOverride::Text(value.into()))
    }

    /// Defines a list value.
    #[must_use]
    pub fn list<I, S>(self, key: OverrideKey, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(key, RawOverride::List(items.into_iter().map(Into::into).collect()))
    }
}

impl OverrideSource for StaticOverrideSource {
    fn lookup(&self, key: OverrideKey) -> Option<RawOverride> {
        self.values.get(&key).cloned()
    }
}

/// Consults several sources in order; the first that defines a key wins.
#[derive(Default)]
pub struct LayeredOverrideSource {
    sources: Vec<Box<dyn OverrideSource>>,
}

impl LayeredOverrideSource {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lower-priority source.
    #[must_use]
    pub fn then(mut self, source: impl OverrideSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }
}

impl fmt::Debug for LayeredOverrideSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayeredOverrideSource")
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl OverrideSource for LayeredOverrideSource {
    fn lookup(&self, key: OverrideKey) -> Option<RawOverride> {
        self.sources.iter().find_map(|source| source.lookup(key))
    }
}

/// Define-once cache of deployment overrides.
///
/// Every key is checked against the source on first access and frozen. The
/// cache is safe to share between threads: concurrent first accesses race on
/// a `OnceLock`, one of them initializes the slot, and every reader observes
/// that value.
pub struct OverrideRegistry {
    source: Box<dyn OverrideSource>,
    slots: [OnceLock<OverrideSlot>; OverrideKey::ALL.len()],
}

static GLOBAL: OnceLock<Arc<OverrideRegistry>> = OnceLock::new();

impl fmt::Debug for OverrideRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let defined: Vec<&str> = OverrideKey::ALL
            .into_iter()
            .filter(|key| self.is_defined(*key))
            .map(|key| key.name())
            .collect();
        f.debug_struct("OverrideRegistry")
            .field("defined", &defined)
            .finish_non_exhaustive()
    }
}

impl OverrideRegistry {
    /// Creates a registry over `source`.
    #[must_use]
    pub fn new(source: impl OverrideSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            slots: Default::default(),
        }
    }

    /// Creates a registry over the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(EnvOverrideSource::new())
    }

    /// Creates a registry that never overrides anything.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(StaticOverrideSource::new())
    }

    /// Returns the process-wide registry.
    ///
    /// Reads the process environment unless [`install_global`](Self::install_global)
    /// ran first.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::from_env())))
    }

    /// Installs the process-wide registry.
    ///
    /// Fails if a registry is already installed or [`global`](Self::global)
    /// already ran; the registry is handed back.
    pub fn install_global(registry: Self) -> Result<Arc<Self>, Arc<Self>> {
        GLOBAL.set(Arc::new(registry))?;
        Ok(Self::global())
    }

    /// Returns `true` once `key` has been read or defined.
    #[must_use]
    pub fn is_defined(&self, key: OverrideKey) -> bool {
        self.slots[key.index()].get().is_some()
    }

    /// Returns the frozen state of `key`, reading the source on first access.
    pub fn value_of(&self, key: OverrideKey) -> &OverrideSlot {
        self.slots[key.index()].get_or_init(|| {
            let slot = match self.source.lookup(key) {
                Some(raw) => type_override(key, raw),
                None => OverrideSlot::inert(key),
            };
            tracing::debug!(name = key.name(), supplied = slot.supplied, "Captured deployment override");
            slot
        })
    }

    /// Defines `key` unless it is already defined.
    ///
    /// Returns `true` if this call defined the key. A later redefinition is a
    /// no-op.
    pub fn define(&self, key: OverrideKey, value: RawOverride) -> bool {
        self.slots[key.index()].set(type_override(key, value)).is_ok()
    }

    /// Returns a typed snapshot of every override.
    pub fn overrides(&self) -> DeploymentOverrides {
        DeploymentOverrides {
            enable: self.value_of(OverrideKey::Enable).forces_on(),
            api_host: self.value_of(OverrideKey::Host).text().map(str::to_string),
            api_key: self.value_of(OverrideKey::ApiKey).text().map(str::to_string),
            debug: self.value_of(OverrideKey::Debug).forces_on(),
            debug_types: self
                .value_of(OverrideKey::DebugTypes)
                .non_empty_list()
                .map(<[String]>::to_vec),
            disable_ssl: self.value_of(OverrideKey::DisableSsl).forces_on(),
            remove_ui: self.value_of(OverrideKey::RemoveUi).forces_on(),
        }
    }

    /// Returns `true` if the deployment hides the settings page.
    pub fn remove_ui(&self) -> bool {
        self.value_of(OverrideKey::RemoveUi).forces_on()
    }
}

/// The overrides in effect, typed per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentOverrides {
    /// Force `enabled` on.
    pub enable: bool,
    /// Replacement API host.
    pub api_host: Option<String>,
    /// Replacement API key.
    pub api_key: Option<String>,
    /// Force debug mode on.
    pub debug: bool,
    /// Replacement debug types; never an empty list.
    pub debug_types: Option<Vec<String>>,
    /// Force TLS verification off.
    pub disable_ssl: bool,
    /// Hide the settings page.
    pub remove_ui: bool,
}

impl DeploymentOverrides {
    /// Applies the overrides on top of `settings`.
    ///
    /// Returns the names of the overrides that took effect.
    pub fn apply(&self, settings: &mut Settings) -> Vec<&'static str> {
        let mut applied = Vec::new();

        if self.enable {
            settings.enabled = true;
            applied.push(OverrideKey::Enable.name());
        }
        if let Some(host) = &self.api_host {
            settings.api_host.clone_from(host);
            applied.push(OverrideKey::Host.name());
        }
        if let Some(key) = &self.api_key {
            settings.api_key.clone_from(key);
            applied.push(OverrideKey::ApiKey.name());
        }
        if self.debug {
            settings.debug_enabled = true;
            applied.push(OverrideKey::Debug.name());
        }
        if let Some(names) = &self.debug_types {
            settings.debug_types = names
                .iter()
                .filter_map(|name| match name.parse::<DebugType>() {
                    Ok(kind) => Some(kind),
                    Err(e) => {
                        tracing::warn!(name = %name, error = %e, "Ignoring override debug type");
                        None
                    }
                })
                .collect();
            applied.push(OverrideKey::DebugTypes.name());
        }
        if self.disable_ssl {
            settings.ssl_verification_disabled = true;
            applied.push(OverrideKey::DisableSsl.name());
        }

        applied
    }
}

fn type_override(key: OverrideKey, raw: RawOverride) -> OverrideSlot {
    let value = match (key.kind(), raw) {
        (OverrideKind::Flag, RawOverride::Bool(b)) => Some(OverrideValue::Flag(b)),
        (OverrideKind::Flag, RawOverride::Text(s)) if s.trim().is_empty() => {
            Some(OverrideValue::Flag(false))
        }
        (OverrideKind::Flag, RawOverride::Text(s)) => match parse_bool(&s) {
            Some(b) => Some(OverrideValue::Flag(b)),
            None => {
                tracing::warn!(name = key.name(), "Override is not a boolean; treating as false");
                Some(OverrideValue::Flag(false))
            }
        },
        (OverrideKind::Text, RawOverride::Text(s)) => Some(OverrideValue::Text(s)),
        (OverrideKind::List, RawOverride::List(items)) => Some(OverrideValue::List(clean_list(items))),
        (OverrideKind::List, RawOverride::Text(s)) => Some(OverrideValue::List(clean_list(
            s.split(',').map(str::to_string).collect(),
        ))),
        (_, _) => None,
    };

    match value {
        Some(value) => OverrideSlot {
            value,
            supplied: true,
        },
        None => {
            tracing::warn!(name = key.name(), "Override has the wrong type; ignoring");
            OverrideSlot::inert(key)
        }
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        inner: StaticOverrideSource,
        lookups: Arc<AtomicUsize>,
    }

    impl OverrideSource for CountingSource {
        fn lookup(&self, key: OverrideKey) -> Option<RawOverride> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup(key)
        }
    }

    #[test]
    fn test_env_source_with_prefix() {
        std::env::set_var("AUTEST_OVR_AP_HOST", "env.example.org");
        let source = EnvOverrideSource::new().with_prefix("AUTEST_OVR_");
        let host = source.lookup(OverrideKey::Host);
        let key = source.lookup(OverrideKey::ApiKey);
        std::env::remove_var("AUTEST_OVR_AP_HOST");

        assert_eq!(host, Some(RawOverride::Text("env.example.org".into())));
        assert_eq!(key, None);
    }

    #[test]
    fn test_unset_keys_are_inert() {
        let registry = OverrideRegistry::empty();
        assert_eq!(registry.overrides(), DeploymentOverrides::default());
        for key in OverrideKey::ALL {
            assert!(registry.is_defined(key));
            assert!(!registry.value_of(key).supplied);
        }
    }

    #[test]
    fn test_source_consulted_once_per_key() {
        let lookups = Arc::new(AtomicUsize::new(0));
        let registry = OverrideRegistry::new(CountingSource {
            inner: StaticOverrideSource::new().flag(OverrideKey::Debug, true),
            lookups: lookups.clone(),
        });

        let _ = registry.overrides();
        let _ = registry.overrides();
        let _ = registry.value_of(OverrideKey::Debug);
        assert_eq!(lookups.load(Ordering::SeqCst), OverrideKey::ALL.len());
    }

    #[test]
    fn test_define_is_first_writer_wins() {
        let registry = OverrideRegistry::empty();
        assert!(!registry.is_defined(OverrideKey::Host));
        assert!(registry.define(OverrideKey::Host, RawOverride::Text("a.example".into())));
        assert!(!registry.define(OverrideKey::Host, RawOverride::Text("b.example".into())));
        assert_eq!(registry.value_of(OverrideKey::Host).text(), Some("a.example"));
    }

    #[test]
    fn test_define_after_read_is_noop() {
        let registry = OverrideRegistry::empty();
        assert!(!registry.value_of(OverrideKey::Enable).forces_on());
        assert!(!registry.define(OverrideKey::Enable, RawOverride::Bool(true)));
        assert!(!registry.overrides().enable);
    }

    #[test]
    fn test_flags_only_force_true() {
        let registry = OverrideRegistry::new(
            StaticOverrideSource::new()
                .flag(OverrideKey::Enable, false)
                .text(OverrideKey::DisableSsl, "0"),
        );
        let overrides = registry.overrides();
        assert!(!overrides.enable);
        assert!(!overrides.disable_ssl);
        assert!(registry.value_of(OverrideKey::Enable).supplied);
    }

    #[test]
    fn test_unparseable_flag_does_not_force() {
        let registry =
            OverrideRegistry::new(StaticOverrideSource::new().text(OverrideKey::Debug, "sometimes"));
        assert!(!registry.overrides().debug);
    }

    #[test]
    fn test_list_from_comma_string() {
        let registry = OverrideRegistry::new(
            StaticOverrideSource::new().text(OverrideKey::DebugTypes, " request, ,string "),
        );
        assert_eq!(
            registry.overrides().debug_types,
            Some(vec!["request".to_string(), "string".to_string()])
        );
    }

    #[test]
    fn test_empty_list_does_not_replace() {
        let registry = OverrideRegistry::new(
            StaticOverrideSource::new().list(OverrideKey::DebugTypes, Vec::<String>::new()),
        );
        assert!(registry.value_of(OverrideKey::DebugTypes).supplied);
        assert_eq!(registry.overrides().debug_types, None);
    }

    #[test]
    fn test_wrong_type_is_ignored() {
        let registry =
            OverrideRegistry::new(StaticOverrideSource::new().flag(OverrideKey::Host, true));
        assert!(!registry.value_of(OverrideKey::Host).supplied);
        assert_eq!(registry.overrides().api_host, None);
    }

    #[test]
    fn test_empty_text_still_replaces() {
        let registry =
            OverrideRegistry::new(StaticOverrideSource::new().text(OverrideKey::ApiKey, ""));
        assert_eq!(registry.overrides().api_key, Some(String::new()));
    }

    #[test]
    fn test_file_source() {
        let source = FileOverrideSource::from_toml_str(
            r#"
            AP_ENABLE = 1
            AP_HOST = "mirror.example.org"
            AP_DEBUG_TYPES = ["request", 5, "response"]
            AP_DISABLE_SSL = false
            AP_UNKNOWN = "x"
            "#,
        )
        .unwrap();

        assert_eq!(source.lookup(OverrideKey::Enable), Some(RawOverride::Bool(true)));
        assert_eq!(
            source.lookup(OverrideKey::Host),
            Some(RawOverride::Text("mirror.example.org".into()))
        );
        assert_eq!(
            source.lookup(OverrideKey::DebugTypes),
            Some(RawOverride::List(vec!["request".into(), "response".into()]))
        );
        assert_eq!(source.lookup(OverrideKey::DisableSsl), Some(RawOverride::Bool(false)));
        assert_eq!(source.lookup(OverrideKey::ApiKey), None);
    }

    #[test]
    fn test_file_source_missing_file() {
        let err = FileOverrideSource::from_path("/nonexistent/overrides.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_file_source_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overrides.toml");
        std::fs::write(&path, "AP_REMOVE_UI = true\n").unwrap();
        let registry = OverrideRegistry::new(FileOverrideSource::from_path(&path).unwrap());
        assert!(registry.remove_ui());
    }

    #[test]
    fn test_layered_first_source_wins() {
        let source = LayeredOverrideSource::new()
            .then(StaticOverrideSource::new().text(OverrideKey::Host, "first.example"))
            .then(
                StaticOverrideSource::new()
                    .text(OverrideKey::Host, "second.example")
                    .text(OverrideKey::ApiKey, "k"),
            );
        assert_eq!(source.lookup(OverrideKey::Host), Some(RawOverride::Text("first.example".into())));
        assert_eq!(source.lookup(OverrideKey::ApiKey), Some(RawOverride::Text("k".into())));
        assert_eq!(source.lookup(OverrideKey::Debug), None);
    }

    #[test]
    fn test_apply() {
        let overrides = DeploymentOverrides {
            enable: true,
            api_host: Some("mirror.example.org".into()),
            debug_types: Some(vec!["response".into(), "bogus".into()]),
            ..DeploymentOverrides::default()
        };
        let mut settings = Settings::default();
        let applied = overrides.apply(&mut settings);

        assert!(settings.enabled);
        assert_eq!(settings.api_host, "mirror.example.org");
        assert_eq!(settings.debug_types, [DebugType::Response].into());
        assert_eq!(applied, vec!["AP_ENABLE", "AP_HOST", "AP_DEBUG_TYPES"]);
    }

    #[test]
    fn test_concurrent_first_access_agrees() {
        let registry = Arc::new(OverrideRegistry::new(
            StaticOverrideSource::new().text(OverrideKey::Host, "race.example"),
        ));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.value_of(OverrideKey::Host).clone())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().text(), Some("race.example"));
        }
    }

    #[test]
    fn test_key_names_round_trip() {
        for key in OverrideKey::ALL {
            assert_eq!(OverrideKey::from_name(key.name()), Some(key));
        }
        assert_eq!(OverrideKey::from_name("AP_NOPE"), None);
    }
}
