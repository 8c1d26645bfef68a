//! Settings schema types.
//!
//! Two shapes of the same record live here:
//!
//! - [`StoredSettings`] - what the option store holds, and what the settings
//!   form edits. It keeps the `"other"` host sentinel next to the free-form
//!   host and the debug types as a name-to-flag map.
//! - [`Settings`] - the effective configuration after resolution. The host is
//!   collapsed to a single value and the debug types are a set.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Option name of the stored settings record.
pub const SETTINGS_OPTION: &str = "aspireupdate_settings";

/// Option name of the post-reset notice state.
pub const RESET_NOTICE_OPTION: &str = "aspireupdate-reset";

/// Host used when nothing else supplies one.
pub const DEFAULT_API_HOST: &str = "api.aspirecloud.org";

/// Host preset value meaning "use `api_host_other`".
pub const OTHER_HOST: &str = "other";

/// Kinds of debug output the plugin can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugType {
    /// Outgoing request URL and headers.
    Request,
    /// Response headers and body.
    Response,
    /// Strings being rewritten.
    String,
}

impl DebugType {
    /// All debug types in display order.
    pub const ALL: [Self; 3] = [Self::Request, Self::Response, Self::String];

    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::String => "string",
        }
    }

    /// Returns the label shown on the settings form.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Request => "Request",
            Self::Response => "Response",
            Self::String => "String",
        }
    }
}

impl fmt::Display for DebugType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DebugType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "request" => Ok(Self::Request),
            "response" => Ok(Self::Response),
            "string" => Ok(Self::String),
            other => Err(format!("unknown debug type: {other}")),
        }
    }
}

/// A selectable API host on the settings form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HostPreset {
    /// Stored value.
    pub value: &'static str,
    /// Label shown in the select box.
    pub label: &'static str,
    /// Whether the host needs an API key.
    pub requires_api_key: bool,
    /// Where an API key can be requested, if the host issues them.
    pub api_key_url: Option<&'static str>,
}

/// Hosts offered by the settings form. The last entry is the free-form sentinel.
pub const HOST_PRESETS: &[HostPreset] = &[
    HostPreset {
        value: DEFAULT_API_HOST,
        label: "AspireCloud (api.aspirecloud.org)",
        requires_api_key: true,
        api_key_url: Some("api.aspirecloud.org/v1/apitoken"),
    },
    HostPreset {
        value: OTHER_HOST,
        label: "Other",
        requires_api_key: false,
        api_key_url: None,
    },
];

/// The settings record as persisted in the option store.
///
/// Reading is lenient: missing keys default to empty or `false`, booleans may
/// be stored as `0`/`1` or strings, and debug types may be a list of names
/// instead of a map. Unknown keys are ignored.
///
/// # Example
///
/// ```
/// use aspireupdate_config::StoredSettings;
/// use serde_json::json;
///
/// let stored = StoredSettings::from_value(json!({
///     "enable": 1,
///     "api_host": "other",
///     "api_host_other": "updates.example.org",
///     "enable_debug_type": {"request": "1", "response": 0}
/// })).unwrap();
///
/// assert!(stored.enable);
/// assert_eq!(stored.enable_debug_type.get("request"), Some(&true));
/// assert_eq!(stored.enable_debug_type.get("response"), Some(&false));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredSettings {
    /// Rewrite API requests to the configured host.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enable: bool,

    /// API credential; may be empty.
    #[serde(default, deserialize_with = "lenient_string")]
    pub api_key: String,

    /// Host preset value, or [`OTHER_HOST`].
    #[serde(default, deserialize_with = "lenient_string")]
    pub api_host: String,

    /// Free-form host used when `api_host` is [`OTHER_HOST`].
    #[serde(default, deserialize_with = "lenient_string")]
    pub api_host_other: String,

    /// Debug mode.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub enable_debug: bool,

    /// Debug type name to enabled flag.
    #[serde(default, deserialize_with = "lenient_flag_map")]
    pub enable_debug_type: BTreeMap<String, bool>,

    /// Skip TLS certificate verification.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub disable_ssl_verification: bool,
}

impl StoredSettings {
    /// The compiled-in defaults.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            ..Self::default()
        }
    }

    /// Decodes a stored JSON value.
    ///
    /// A `null` or non-object value decodes to an all-empty record rather than
    /// failing, matching how the option store treats corrupt entries.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Object(_) => serde_json::from_value(value),
            _ => Ok(Self::default()),
        }
    }

    /// Encodes the record for the option store.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Returns `true` if the stored host is the free-form sentinel.
    #[must_use]
    pub fn uses_other_host(&self) -> bool {
        self.api_host == OTHER_HOST
    }
}

/// Names of the resolvable settings, as used by [`Settings::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// `enable`
    Enable,
    /// `api_host`
    ApiHost,
    /// `api_key`
    ApiKey,
    /// `enable_debug`
    EnableDebug,
    /// `enable_debug_type`
    EnableDebugType,
    /// `disable_ssl_verification`
    DisableSslVerification,
}

impl SettingKey {
    /// All keys in form order.
    pub const ALL: [Self; 6] = [
        Self::Enable,
        Self::ApiHost,
        Self::ApiKey,
        Self::EnableDebug,
        Self::EnableDebugType,
        Self::DisableSslVerification,
    ];

    /// Returns the field name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::ApiHost => "api_host",
            Self::ApiKey => "api_key",
            Self::EnableDebug => "enable_debug",
            Self::EnableDebugType => "enable_debug_type",
            Self::DisableSslVerification => "disable_ssl_verification",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown setting: {s}"))
    }
}

/// A dynamically typed setting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// A flag.
    Bool(bool),
    /// A string.
    Text(String),
    /// A list of names.
    List(Vec<String>),
}

impl SettingValue {
    /// Returns the flag, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list, if this is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// The effective configuration.
///
/// `api_host` is never empty and `debug_types` is always a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Rewrite API requests to the configured host.
    pub enabled: bool,
    /// Effective API host.
    pub api_host: String,
    /// API credential; may be empty.
    pub api_key: String,
    /// Debug mode.
    pub debug_enabled: bool,
    /// Enabled debug output kinds.
    pub debug_types: BTreeSet<DebugType>,
    /// Skip TLS certificate verification.
    pub ssl_verification_disabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: false,
            api_host: DEFAULT_API_HOST.to_string(),
            api_key: String::new(),
            debug_enabled: false,
            debug_types: BTreeSet::new(),
            ssl_verification_disabled: false,
        }
    }
}

impl Settings {
    /// Returns one setting as a [`SettingValue`].
    #[must_use]
    pub fn get(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::Enable => self.enabled.into(),
            SettingKey::ApiHost => self.api_host.clone().into(),
            SettingKey::ApiKey => self.api_key.clone().into(),
            SettingKey::EnableDebug => self.debug_enabled.into(),
            SettingKey::EnableDebugType => SettingValue::List(
                self.debug_types
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            ),
            SettingKey::DisableSslVerification => self.ssl_verification_disabled.into(),
        }
    }

    /// Returns `true` if debug mode is on and `kind` is enabled.
    #[must_use]
    pub fn debugs(&self, kind: DebugType) -> bool {
        self.debug_enabled && self.debug_types.contains(&kind)
    }
}

/// Loose truthiness for submitted and stored values.
///
/// `null`, `false`, `0`, empty strings, `"0"`, `"false"`, `"off"`, `"no"`,
/// and empty arrays or objects are false; everything else is true.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty()
                || s == "0"
                || s.eq_ignore_ascii_case("false")
                || s.eq_ignore_ascii_case("off")
                || s.eq_ignore_ascii_case("no"))
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(truthy(&Value::deserialize(deserializer)?))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_flag_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, bool>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map.into_iter().map(|(k, v)| (k, truthy(&v))).collect(),
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some((name, true)),
                _ => None,
            })
            .collect(),
        _ => BTreeMap::new(),
    })
}
