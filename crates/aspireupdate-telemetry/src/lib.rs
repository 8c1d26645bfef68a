//! Observability for AspireUpdate.
//!
//! - **Logging**: structured JSON or pretty output via `tracing-subscriber`
//! - **Metrics**: event counters via the `metrics` crate, renderable in
//!   Prometheus text format
//!
//! # Example
//!
//! ```no_run
//! use aspireupdate_telemetry::{init_telemetry, LogConfig, MetricsConfig};
//!
//! init_telemetry(&LogConfig::production(), &MetricsConfig::default()).unwrap();
//!
//! aspireupdate_telemetry::metrics::record_reset();
//! let text = aspireupdate_telemetry::metrics::render_metrics().unwrap_or_default();
//! assert!(text.contains("aspireupdate_resets_total"));
//! ```

#![doc(html_root_url = "https://docs.rs/aspireupdate-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use crate::metrics::{init_metrics, render_metrics, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging and metrics.
///
/// # Errors
///
/// Returns the first subsystem error.
pub fn init_telemetry(log: &LogConfig, metrics: &MetricsConfig) -> TelemetryResult<()> {
    init_logging(log)?;
    init_metrics(metrics)?;
    Ok(())
}
