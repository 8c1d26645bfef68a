//! The settings form.
//!
//! The core never builds markup. It describes each field with a
//! [`FieldDescriptor`] and hands descriptors to a host-supplied
//! [`FieldRenderer`]. Submissions come back through [`SettingsForm::submit`],
//! which checks the form nonce, sanitizes, and stores the record.

use std::sync::Arc;

use aspireupdate_config::{
    sanitize, DebugType, HostPreset, SettingsResolver, StoredSettings, HOST_PRESETS,
    SETTINGS_OPTION,
};
use aspireupdate_core::{AdminRequest, Capability, Nonce, NonceAction, NonceVerifier};
use aspireupdate_telemetry::metrics;
use serde::Serialize;
use serde_json::Value;

use crate::error::AdminResult;

/// Name of the submitted form nonce field.
pub const FORM_NONCE_FIELD: &str = "_wpnonce";

/// Title of the settings page.
pub const PAGE_TITLE: &str = "AspireUpdate Settings";

/// One option of a checkbox group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckboxOption {
    /// Submitted key.
    pub value: &'static str,
    /// Label.
    pub label: &'static str,
    /// Current state.
    pub checked: bool,
}

/// What kind of input a field is, with its current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FieldKind {
    /// Single-line text.
    Text {
        /// Current value.
        value: String,
    },
    /// Multi-line text.
    Textarea {
        /// Current value.
        value: String,
    },
    /// A single checkbox.
    Checkbox {
        /// Current state.
        checked: bool,
    },
    /// Several checkboxes submitted as a map.
    CheckboxGroup {
        /// Options in display order.
        options: Vec<CheckboxOption>,
    },
    /// A secret with a "Generate API Key" button.
    ApiKey {
        /// Current value.
        value: String,
    },
    /// A host select with a free-form companion input for `other`.
    Hosts {
        /// Presets in display order.
        presets: Vec<HostPreset>,
        /// Selected preset value.
        selected: String,
        /// Companion input value.
        other: String,
    },
}

impl FieldKind {
    /// The renderer-facing type name.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Textarea { .. } => "textarea",
            Self::Checkbox { .. } => "checkbox",
            Self::CheckboxGroup { .. } => "checkbox-group",
            Self::ApiKey { .. } => "api-key",
            Self::Hosts { .. } => "hosts",
        }
    }
}

/// Everything a renderer needs to draw one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Field id; also the key in the submitted settings map.
    pub id: &'static str,
    /// Row title.
    pub title: &'static str,
    /// Input kind and current value.
    pub kind: FieldKind,
    /// Help text below the input.
    pub description: &'static str,
    /// Extra CSS class for the row.
    pub css_class: Option<&'static str>,
}

impl FieldDescriptor {
    /// The `name` attribute of the input, e.g. `aspireupdate_settings[enable]`.
    pub fn input_name(&self) -> String {
        format!("{SETTINGS_OPTION}[{}]", self.id)
    }

    /// The `id` attribute of the input.
    pub fn dom_id(&self) -> String {
        format!("aspireupdate-settings-field-{}", self.id)
    }
}

/// A titled group of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsSection {
    /// Section id.
    pub id: &'static str,
    /// Heading.
    pub title: &'static str,
    /// Fields in display order.
    pub fields: Vec<FieldDescriptor>,
}

impl SettingsSection {
    /// Builds the sections for `stored`, in display order.
    pub fn for_record(stored: &StoredSettings) -> Vec<Self> {
        vec![
            Self {
                id: "aspireupdate_settings_section",
                title: "API Configuration",
                fields: vec![
                    FieldDescriptor {
                        id: "enable",
                        title: "Enable AspireUpdate API Rewrites",
                        kind: FieldKind::Checkbox {
                            checked: stored.enable,
                        },
                        description: "",
                        css_class: None,
                    },
                    FieldDescriptor {
                        id: "api_host",
                        title: "API Host",
                        kind: FieldKind::Hosts {
                            presets: HOST_PRESETS.to_vec(),
                            selected: stored.api_host.clone(),
                            other: stored.api_host_other.clone(),
                        },
                        description: "Your new API Host.",
                        css_class: None,
                    },
                    FieldDescriptor {
                        id: "api_key",
                        title: "API Key",
                        kind: FieldKind::ApiKey {
                            value: stored.api_key.clone(),
                        },
                        description: "Provides an API key for repositories that may require authentication.",
                        css_class: None,
                    },
                ],
            },
            Self {
                id: "aspireupdate_debug_settings_section",
                title: "API Debug Configuration",
                fields: vec![
                    FieldDescriptor {
                        id: "enable_debug",
                        title: "Enable Debug Mode",
                        kind: FieldKind::Checkbox {
                            checked: stored.enable_debug,
                        },
                        description: "Enables debug mode for the plugin.",
                        css_class: None,
                    },
                    FieldDescriptor {
                        id: "enable_debug_type",
                        title: "Enable Debug Type",
                        kind: FieldKind::CheckboxGroup {
                            options: DebugType::ALL
                                .iter()
                                .map(|kind| CheckboxOption {
                                    value: kind.as_str(),
                                    label: kind.label(),
                                    checked: stored
                                        .enable_debug_type
                                        .get(kind.as_str())
                                        .copied()
                                        .unwrap_or(false),
                                })
                                .collect(),
                        },
                        description: "Outputs the request URL and headers / response headers and body / string that is being rewritten.",
                        css_class: None,
                    },
                    FieldDescriptor {
                        id: "disable_ssl_verification",
                        title: "Disable SSL Verification",
                        kind: FieldKind::Checkbox {
                            checked: stored.disable_ssl_verification,
                        },
                        description: "Disables the verification of SSL to allow local testing.",
                        css_class: Some("advanced-setting"),
                    },
                ],
            },
        ]
    }
}

/// Turns descriptors into markup. Supplied by the host.
pub trait FieldRenderer {
    /// Renders one field.
    fn render_field(&self, field: &FieldDescriptor) -> String;

    /// Wraps a section's rendered fields.
    fn render_section(&self, section: &SettingsSection, fields: Vec<String>) -> String {
        format!("<h2>{}</h2>{}", section.title, fields.concat())
    }
}

/// The settings page model for one request.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsPage {
    /// Page heading.
    pub title: &'static str,
    /// Sections in display order.
    pub sections: Vec<SettingsSection>,
    /// Nonce to submit as [`FORM_NONCE_FIELD`].
    pub form_nonce: Nonce,
    /// Nonce for script-initiated requests from the page.
    pub ajax_nonce: Nonce,
    /// Link that resets the settings.
    pub reset_url: String,
}

impl SettingsPage {
    /// Builds the page for `ctx`'s caller from the stored record.
    ///
    /// Shows stored values, not resolved ones, so deployment overrides never
    /// leak into the form. A missing record is written with the defaults
    /// first.
    pub fn build(
        ctx: &AdminRequest,
        resolver: &SettingsResolver,
        nonces: &dyn NonceVerifier,
        reset_url: String,
    ) -> AdminResult<Self> {
        let (stored, _) = resolver.repository().load_or_heal()?;
        Ok(Self {
            title: PAGE_TITLE,
            sections: SettingsSection::for_record(&stored),
            form_nonce: nonces.create(NonceAction::SaveSettings, ctx.identity()),
            ajax_nonce: nonces.create(NonceAction::Ajax, ctx.identity()),
            reset_url,
        })
    }

    /// Renders every section with `renderer` and concatenates the result.
    pub fn render(&self, renderer: &dyn FieldRenderer) -> String {
        self.sections
            .iter()
            .map(|section| {
                let fields = section.fields.iter().map(|f| renderer.render_field(f)).collect();
                renderer.render_section(section, fields)
            })
            .collect()
    }

    /// Looks a field up by id.
    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.sections
            .iter()
            .flat_map(|section| section.fields.iter())
            .find(|field| field.id == id)
    }
}

/// Why a submission was not saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No form nonce was submitted.
    MissingNonce,
    /// The form nonce did not verify.
    InvalidNonce,
    /// The caller may not manage options.
    Forbidden,
}

impl RejectReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::MissingNonce => "missing nonce",
            Self::InvalidNonce => "invalid nonce",
            Self::Forbidden => "missing capability",
        }
    }
}

/// Result of a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The sanitized record that was stored.
    Saved(StoredSettings),
    /// Nothing was written.
    Rejected(RejectReason),
}

/// Handles settings form submissions.
#[derive(Clone)]
pub struct SettingsForm {
    nonces: Arc<dyn NonceVerifier>,
}

impl std::fmt::Debug for SettingsForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsForm").finish_non_exhaustive()
    }
}

impl SettingsForm {
    /// Creates the form handler.
    pub fn new(nonces: Arc<dyn NonceVerifier>) -> Self {
        Self { nonces }
    }

    /// Validates and stores a submission.
    ///
    /// `raw` is the submitted body: the nonce under [`FORM_NONCE_FIELD`] and
    /// the fields under [`SETTINGS_OPTION`]. Unchecked boxes are absent, so a
    /// submission without the settings map clears every flag.
    pub fn submit(
        &self,
        ctx: &AdminRequest,
        raw: &Value,
        resolver: &SettingsResolver,
    ) -> AdminResult<SaveOutcome> {
        let action = NonceAction::SaveSettings;
        let reject = |reason: RejectReason| -> AdminResult<SaveOutcome> {
            aspireupdate_telemetry::log_request_rejected!(ctx.request_id(), action, reason.as_str());
            metrics::record_settings_save("rejected");
            Ok(SaveOutcome::Rejected(reason))
        };

        if !ctx.identity().can(&Capability::ManageOptions) {
            return reject(RejectReason::Forbidden);
        }
        let Some(nonce) = raw.get(FORM_NONCE_FIELD).and_then(Value::as_str) else {
            return reject(RejectReason::MissingNonce);
        };
        if self.nonces.verify(action, ctx.identity(), nonce).is_none() {
            metrics::record_nonce_rejection(action.as_str());
            return reject(RejectReason::InvalidNonce);
        }

        let stored = sanitize(raw.get(SETTINGS_OPTION).unwrap_or(&Value::Null));
        resolver.repository().save(&stored)?;
        resolver.invalidate();

        metrics::record_settings_save("saved");
        aspireupdate_telemetry::log_settings_saved!(ctx.request_id(), ctx.identity().log_id());
        Ok(SaveOutcome::Saved(stored))
    }
}
