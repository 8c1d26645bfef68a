//! Request context types.
//!
//! The [`AdminRequest`] carries the per-request state the settings core reads:
//! who is calling and which query parameters arrived with the request.

use crate::identity::AdminIdentity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it useful for log correlation.
///
/// # Example
///
/// ```
/// use aspireupdate_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Per-request context handed to the admin handlers.
///
/// Query parameters are kept verbatim; handlers compare them against the
/// exact values they expect and never echo them back.
///
/// # Example
///
/// ```
/// use aspireupdate_core::{AdminIdentity, AdminRequest};
///
/// let ctx = AdminRequest::from_query_string(
///     AdminIdentity::administrator(1, "session"),
///     "page=aspireupdate-settings&reset=reset",
/// );
/// assert_eq!(ctx.query("reset"), Some("reset"));
/// assert!(ctx.query_equals("page", "aspireupdate-settings"));
/// ```
#[derive(Debug, Clone)]
pub struct AdminRequest {
    request_id: RequestId,
    identity: AdminIdentity,
    query: BTreeMap<String, String>,
}

impl AdminRequest {
    /// Creates a context with no query parameters.
    #[must_use]
    pub fn new(identity: AdminIdentity) -> Self {
        Self {
            request_id: RequestId::new(),
            identity,
            query: BTreeMap::new(),
        }
    }

    /// Creates a context from a raw, percent-encoded query string.
    ///
    /// A leading `?` is ignored. When a parameter repeats, the last value wins.
    #[must_use]
    pub fn from_query_string(identity: AdminIdentity, query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut ctx = Self::new(identity);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            ctx.query.insert(key.into_owned(), value.into_owned());
        }
        ctx
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the caller identity.
    #[must_use]
    pub const fn identity(&self) -> &AdminIdentity {
        &self.identity
    }

    /// Returns a query parameter.
    #[must_use]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// Returns `true` if the query parameter is present and equals `expected`.
    #[must_use]
    pub fn query_equals(&self, key: &str, expected: &str) -> bool {
        self.query(key) == Some(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_uniqueness() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_from_query_string_decodes() {
        let ctx = AdminRequest::from_query_string(
            AdminIdentity::Anonymous,
            "?reset=reset&reset-nonce=abc%20def",
        );
        assert_eq!(ctx.query("reset"), Some("reset"));
        assert_eq!(ctx.query("reset-nonce"), Some("abc def"));
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn test_last_value_wins() {
        let ctx = AdminRequest::from_query_string(AdminIdentity::Anonymous, "a=1&a=2");
        assert_eq!(ctx.query("a"), Some("2"));
    }

    #[test]
    fn test_query_equals_is_exact() {
        let ctx = AdminRequest::new(AdminIdentity::Anonymous).with_query("reset", "Reset");
        assert!(!ctx.query_equals("reset", "reset"));
        assert!(ctx.query_equals("reset", "Reset"));
    }
}
