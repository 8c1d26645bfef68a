//! Error types for AspireUpdate.
//!
//! This module provides the [`CoreError`] type, the error type hosts see at
//! the boundary of the settings core. Each member crate keeps its own error
//! enum and converts into [`CoreError`] so embedding code only has to match
//! on one type.
//!
//! Malformed form input and failed nonce or capability checks never become
//! errors: the sanitizer degrades to safe defaults and rejected requests are
//! treated as "feature not invoked". Only storage and configuration failures
//! reach the host.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// Categories of errors for classification and handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// The option store failed.
    Storage,
    /// The plugin or the deployment is misconfigured.
    Configuration,
}

impl ErrorCategory {
    /// Returns the snake_case name used in log fields.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Storage => "storage",
            Self::Configuration => "configuration",
        }
    }
}

/// Standard error type for AspireUpdate.
///
/// # Example
///
/// ```
/// use aspireupdate_core::{CoreError, ErrorCategory};
///
/// let err = CoreError::configuration("nonce secret must be at least 32 bytes");
/// assert_eq!(err.category(), ErrorCategory::Configuration);
/// ```
#[derive(Error, Debug)]
pub enum CoreError {
    /// The option store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// The plugin or the deployment is misconfigured.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable error message.
        message: String,
        /// The underlying error, if any.
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl CoreError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error with a source error.
    pub fn configuration_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}
