//! Admin identity as established by the host application.
//!
//! Authentication is the host's job. The settings core only needs to know who
//! the caller is (to scope nonces to a user session) and whether the caller
//! holds the capability that guards the settings page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A permission granted to an authenticated admin user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// May view and change plugin options.
    ManageOptions,
    /// Any other host-defined capability.
    Custom(String),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManageOptions => f.write_str("manage_options"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// The caller of an admin request.
///
/// # Example
///
/// ```
/// use aspireupdate_core::{AdminIdentity, Capability};
///
/// let admin = AdminIdentity::user(1, "session-token")
///     .with_capability(Capability::ManageOptions);
/// assert!(admin.can(&Capability::ManageOptions));
/// assert_eq!(admin.log_id(), "user:1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdminIdentity {
    /// A logged-in user.
    User {
        /// Host user ID.
        user_id: u64,
        /// Host session token; nonces are bound to it.
        session_token: String,
        /// Capabilities granted to the user.
        #[serde(default)]
        capabilities: BTreeSet<Capability>,
    },
    /// No authenticated user.
    Anonymous,
}

impl AdminIdentity {
    /// Creates a user identity without capabilities.
    #[must_use]
    pub fn user(user_id: u64, session_token: impl Into<String>) -> Self {
        Self::User {
            user_id,
            session_token: session_token.into(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Creates a user identity holding `manage_options`.
    #[must_use]
    pub fn administrator(user_id: u64, session_token: impl Into<String>) -> Self {
        Self::user(user_id, session_token).with_capability(Capability::ManageOptions)
    }

    /// Grants a capability. Has no effect on anonymous identities.
    #[must_use]
    pub fn with_capability(mut self, capability: Capability) -> Self {
        if let Self::User { capabilities, .. } = &mut self {
            capabilities.insert(capability);
        }
        self
    }

    /// Returns `true` if the caller is logged in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    /// Returns `true` if the caller holds `capability`.
    #[must_use]
    pub fn can(&self, capability: &Capability) -> bool {
        match self {
            Self::User { capabilities, .. } => capabilities.contains(capability),
            Self::Anonymous => false,
        }
    }

    /// Returns the `(user_id, session_token)` pair nonces are bound to.
    ///
    /// Anonymous callers share user ID 0 and an empty session token.
    #[must_use]
    pub fn nonce_subject(&self) -> (u64, &str) {
        match self {
            Self::User {
                user_id,
                session_token,
                ..
            } => (*user_id, session_token.as_str()),
            Self::Anonymous => (0, ""),
        }
    }

    /// Returns a string identifier suitable for logging.
    ///
    /// This never includes the session token.
    #[must_use]
    pub fn log_id(&self) -> String {
        match self {
            Self::User { user_id, .. } => format!("user:{user_id}"),
            Self::Anonymous => "anonymous".to_string(),
        }
    }
}

impl Default for AdminIdentity {
    fn default() -> Self {
        Self::Anonymous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_administrator_has_manage_options() {
        let identity = AdminIdentity::administrator(7, "tok");
        assert!(identity.is_authenticated());
        assert!(identity.can(&Capability::ManageOptions));
    }

    #[test]
    fn test_plain_user_lacks_manage_options() {
        let identity = AdminIdentity::user(7, "tok");
        assert!(!identity.can(&Capability::ManageOptions));
    }

    #[test]
    fn test_anonymous_cannot_gain_capabilities() {
        let identity = AdminIdentity::Anonymous.with_capability(Capability::ManageOptions);
        assert!(!identity.is_authenticated());
        assert!(!identity.can(&Capability::ManageOptions));
        assert_eq!(identity.nonce_subject(), (0, ""));
    }

    #[test]
    fn test_log_id_hides_session() {
        let identity = AdminIdentity::user(42, "very-secret-session");
        assert_eq!(identity.log_id(), "user:42");
        assert!(!identity.log_id().contains("secret"));
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::ManageOptions.to_string(), "manage_options");
        assert_eq!(Capability::Custom("edit_posts".into()).to_string(), "edit_posts");
    }

    #[test]
    fn test_serialization() {
        let identity = AdminIdentity::administrator(3, "s");
        let json = serde_json::to_string(&identity).expect("serialization should work");
        assert!(json.contains("\"type\":\"user\""));
        let parsed: AdminIdentity = serde_json::from_str(&json).expect("deserialization should work");
        assert_eq!(identity, parsed);
    }
}
