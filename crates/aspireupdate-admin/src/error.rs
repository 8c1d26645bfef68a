//! Admin error types.

use aspireupdate_config::ConfigError;
use aspireupdate_core::{CoreError, StoreError};
use thiserror::Error;

/// Errors raised by the admin workflows.
///
/// Failed nonce or capability checks are not errors; they are reported as
/// [`RequestFlow::Continue`](crate::RequestFlow::Continue) or
/// [`SaveOutcome::Rejected`](crate::SaveOutcome::Rejected).
#[derive(Debug, Error)]
pub enum AdminError {
    /// Reading or resolving the settings failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The option store failed.
    #[error("option store error: {0}")]
    Store(#[from] StoreError),

    /// The admin base URL is not usable.
    #[error("invalid admin URL {url}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Building an HTTP response failed.
    #[error("failed to build response: {0}")]
    Http(#[from] http::Error),
}

impl AdminError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

impl From<AdminError> for CoreError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Config(config) => config.into(),
            AdminError::Store(store) => Self::Storage(store),
            other => Self::configuration_with_source(other.to_string(), other),
        }
    }
}
