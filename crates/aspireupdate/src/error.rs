//! Facade error type.

use aspireupdate_admin::AdminError;
use aspireupdate_config::ConfigError;
use aspireupdate_core::{CoreError, StoreError};
use aspireupdate_telemetry::TelemetryError;
use thiserror::Error;

/// Errors raised while assembling or running the plugin.
#[derive(Debug, Error)]
pub enum Error {
    /// Runtime configuration or override loading failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The option store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Nonce service setup failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An admin workflow failed.
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Logging or metrics setup failed.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Result type for the facade.
pub type Result<T, E = Error> = std::result::Result<T, E>;
