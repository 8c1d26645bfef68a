//! Event counters for the settings core.
//!
//! Counters are recorded through the `metrics` facade and are no-ops until a
//! recorder is installed. [`init_metrics`] installs a Prometheus recorder
//! whose text output hosts can serve from their own endpoint via
//! [`render_metrics`].
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `aspireupdate_resets_total` | Counter | - | Settings resets performed |
//! | `aspireupdate_reset_notices_total` | Counter | - | Reset notices shown |
//! | `aspireupdate_settings_saves_total` | Counter | `outcome` | Settings form submissions |
//! | `aspireupdate_nonce_rejections_total` | Counter | `action` | Requests ignored for a bad nonce |

use std::sync::OnceLock;

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Settings resets performed.
pub const RESETS_TOTAL: &str = "aspireupdate_resets_total";

/// Reset notices shown.
pub const RESET_NOTICES_TOTAL: &str = "aspireupdate_reset_notices_total";

/// Settings form submissions, by outcome.
pub const SETTINGS_SAVES_TOTAL: &str = "aspireupdate_settings_saves_total";

/// Requests ignored because their nonce did not verify, by action.
pub const NONCE_REJECTIONS_TOTAL: &str = "aspireupdate_nonce_rejections_total";

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether to install a recorder.
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Installs the Prometheus recorder and describes the standard counters.
///
/// Calling this more than once is a no-op.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if another recorder is already
/// installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    let _ = METRICS_HANDLE.set(handle);

    register_metric_descriptions();
    Ok(())
}

/// Renders the counters in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(RESETS_TOTAL, "Settings resets performed");
    describe_counter!(RESET_NOTICES_TOTAL, "Reset confirmation notices shown");
    describe_counter!(SETTINGS_SAVES_TOTAL, "Settings form submissions by outcome");
    describe_counter!(
        NONCE_REJECTIONS_TOTAL,
        "Requests ignored because their nonce did not verify"
    );
}

/// Records a settings reset.
pub fn record_reset() {
    counter!(RESETS_TOTAL).increment(1);
}

/// Records a reset notice being shown.
pub fn record_reset_notice() {
    counter!(RESET_NOTICES_TOTAL).increment(1);
}

/// Records a settings form submission.
///
/// * `outcome` - `"saved"` or `"rejected"`
pub fn record_settings_save(outcome: &'static str) {
    counter!(SETTINGS_SAVES_TOTAL, "outcome" => outcome).increment(1);
}

/// Records a request ignored for a bad nonce.
///
/// * `action` - the nonce action string
pub fn record_nonce_rejection(action: &'static str) {
    counter!(NONCE_REJECTIONS_TOTAL, "action" => action).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_reset();
        record_reset_notice();
        record_settings_save("saved");
        record_nonce_rejection("aspireupdate-reset-nonce");
    }

    #[test]
    fn test_disabled_metrics() {
        assert!(init_metrics(&MetricsConfig { enabled: false }).is_ok());
    }

    #[test]
    fn test_metric_names() {
        for name in [
            RESETS_TOTAL,
            RESET_NOTICES_TOTAL,
            SETTINGS_SAVES_TOTAL,
            NONCE_REJECTIONS_TOTAL,
        ] {
            assert!(name.starts_with("aspireupdate_"));
            assert!(name.ends_with("_total"));
        }
    }
}
