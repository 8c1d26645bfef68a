//! One-shot reset notice.
//!
//! A reset arms a flag next to the settings record and redirects. The next
//! request that carries the redirect's display nonce shows the confirmation
//! once and clears the flag, so reloading the page shows nothing.

use std::sync::Arc;

use aspireupdate_config::RESET_NOTICE_OPTION;
use aspireupdate_core::{AdminRequest, NonceAction, NonceVerifier, OptionStore};
use aspireupdate_telemetry::metrics;
use serde::Serialize;
use serde_json::Value;

use crate::error::AdminResult;

/// Query parameter marking the post-reset redirect.
pub const RESET_SUCCESS_PARAM: &str = "reset-success";

/// Expected value of [`RESET_SUCCESS_PARAM`].
pub const RESET_SUCCESS_VALUE: &str = "success";

/// Query parameter carrying the display nonce.
pub const RESET_SUCCESS_NONCE_PARAM: &str = "reset-success-nonce";

/// Message shown after a reset.
pub const RESET_SUCCESS_MESSAGE: &str = "Settings have been reset to default.";

const ARMED_VALUE: &str = "true";

/// Persisted state of the reset notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetNotice {
    /// Nothing to show.
    Idle,
    /// A reset happened and its notice has not been shown yet.
    Armed,
}

/// The reset notice flag in the option store.
///
/// `Armed` is stored as the string `"true"`; `Idle` is the absence of the
/// option.
#[derive(Clone)]
pub struct ResetNoticeStore {
    store: Arc<dyn OptionStore>,
}

impl std::fmt::Debug for ResetNoticeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetNoticeStore")
            .field("option", &RESET_NOTICE_OPTION)
            .finish_non_exhaustive()
    }
}

impl ResetNoticeStore {
    /// Creates a flag over `store`.
    pub fn new(store: Arc<dyn OptionStore>) -> Self {
        Self { store }
    }

    /// Reads the current state.
    pub fn state(&self) -> AdminResult<ResetNotice> {
        Ok(match self.store.get(RESET_NOTICE_OPTION)? {
            Some(Value::String(s)) if s == ARMED_VALUE => ResetNotice::Armed,
            Some(Value::Bool(true)) => ResetNotice::Armed,
            _ => ResetNotice::Idle,
        })
    }

    /// `Idle | Armed -> Armed`.
    pub(crate) fn arm(&self) -> AdminResult<()> {
        self.store
            .set(RESET_NOTICE_OPTION, Value::String(ARMED_VALUE.to_string()))?;
        Ok(())
    }

    /// `Armed -> Idle`; returns the state before the call.
    pub(crate) fn take(&self) -> AdminResult<ResetNotice> {
        let state = self.state()?;
        if state == ResetNotice::Armed {
            self.store.delete(RESET_NOTICE_OPTION)?;
        }
        Ok(state)
    }
}

/// Severity of an admin notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Green.
    Success,
    /// Blue.
    Info,
    /// Yellow.
    Warning,
    /// Red.
    Error,
}

impl NoticeLevel {
    /// Returns the level name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A notice for the host to display at the top of an admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminNotice {
    /// Severity.
    pub level: NoticeLevel,
    /// Whether the user can close it.
    pub dismissible: bool,
    /// Plain-text message.
    pub message: String,
}

impl AdminNotice {
    /// The post-reset confirmation.
    pub fn reset_success() -> Self {
        Self {
            level: NoticeLevel::Success,
            dismissible: true,
            message: RESET_SUCCESS_MESSAGE.to_string(),
        }
    }

    /// CSS classes for the notice container.
    pub fn css_classes(&self) -> String {
        let mut classes = format!("notice notice-{}", self.level.as_str());
        if self.dismissible {
            classes.push_str(" is-dismissible");
        }
        classes
    }
}

/// Decides whether the reset confirmation is shown on this request.
#[derive(Clone)]
pub struct NotificationGate {
    notices: ResetNoticeStore,
    nonces: Arc<dyn NonceVerifier>,
}

impl std::fmt::Debug for NotificationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationGate")
            .field("notices", &self.notices)
            .finish_non_exhaustive()
    }
}

impl NotificationGate {
    /// Creates a gate.
    pub fn new(notices: ResetNoticeStore, nonces: Arc<dyn NonceVerifier>) -> Self {
        Self { notices, nonces }
    }

    /// Returns the notice to show, clearing the flag when it does.
    ///
    /// The notice is shown only when the flag is armed, the request carries
    /// `reset-success=success`, and `reset-success-nonce` verifies for the
    /// display action. In every other case the flag is left untouched.
    pub fn check(&self, ctx: &AdminRequest) -> AdminResult<Option<AdminNotice>> {
        if self.notices.state()? != ResetNotice::Armed {
            return Ok(None);
        }
        if !ctx.query_equals(RESET_SUCCESS_PARAM, RESET_SUCCESS_VALUE) {
            return Ok(None);
        }
        let Some(nonce) = ctx.query(RESET_SUCCESS_NONCE_PARAM) else {
            return Ok(None);
        };

        let action = NonceAction::ResetSuccess;
        if self.nonces.verify(action, ctx.identity(), nonce).is_none() {
            aspireupdate_telemetry::log_request_rejected!(ctx.request_id(), action, "invalid nonce");
            metrics::record_nonce_rejection(action.as_str());
            return Ok(None);
        }

        self.notices.take()?;
        metrics::record_reset_notice();
        tracing::debug!(request_id = %ctx.request_id(), "Showing reset notice");
        Ok(Some(AdminNotice::reset_success()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aspireupdate_core::{fixtures, InMemoryStore};

    fn gate() -> (ResetNoticeStore, NotificationGate) {
        let notices = ResetNoticeStore::new(Arc::new(InMemoryStore::new()));
        let gate = NotificationGate::new(notices.clone(), Arc::new(fixtures::nonce_service()));
        (notices, gate)
    }

    fn display_request() -> AdminRequest {
        let nonce = fixtures::nonce_service().create(NonceAction::ResetSuccess, &fixtures::administrator());
        fixtures::admin_request("page=aspireupdate-settings")
            .with_query(RESET_SUCCESS_PARAM, RESET_SUCCESS_VALUE)
            .with_query(RESET_SUCCESS_NONCE_PARAM, nonce.into_inner())
    }

    #[test]
    fn test_flag_transitions() {
        let (notices, _) = gate();
        assert_eq!(notices.state().unwrap(), ResetNotice::Idle);
        notices.arm().unwrap();
        notices.arm().unwrap();
        assert_eq!(notices.state().unwrap(), ResetNotice::Armed);
        assert_eq!(notices.take().unwrap(), ResetNotice::Armed);
        assert_eq!(notices.take().unwrap(), ResetNotice::Idle);
    }

    #[test]
    fn test_armed_is_stored_as_true_string() {
        let store = Arc::new(InMemoryStore::new());
        ResetNoticeStore::new(store.clone()).arm().unwrap();
        assert_eq!(
            store.get(RESET_NOTICE_OPTION).unwrap(),
            Some(Value::String("true".into()))
        );
    }

    #[test]
    fn test_shows_once() {
        let (notices, gate) = gate();
        notices.arm().unwrap();
        let ctx = display_request();

        assert_eq!(gate.check(&ctx).unwrap(), Some(AdminNotice::reset_success()));
        assert_eq!(gate.check(&ctx).unwrap(), None);
        assert_eq!(notices.state().unwrap(), ResetNotice::Idle);
    }

    #[test]
    fn test_idle_flag_shows_nothing() {
        let (_, gate) = gate();
        assert_eq!(gate.check(&display_request()).unwrap(), None);
    }

    #[test]
    fn test_bad_nonce_keeps_flag() {
        let (notices, gate) = gate();
        notices.arm().unwrap();
        let ctx = fixtures::admin_request("reset-success=success&reset-success-nonce=0000");

        assert_eq!(gate.check(&ctx).unwrap(), None);
        assert_eq!(notices.state().unwrap(), ResetNotice::Armed);
    }

    #[test]
    fn test_trigger_nonce_cannot_display() {
        let (notices, gate) = gate();
        notices.arm().unwrap();
        let trigger = fixtures::nonce_service().create(NonceAction::Reset, &fixtures::administrator());
        let ctx = fixtures::admin_request("reset-success=success")
            .with_query(RESET_SUCCESS_NONCE_PARAM, trigger.into_inner());

        assert_eq!(gate.check(&ctx).unwrap(), None);
        assert_eq!(notices.state().unwrap(), ResetNotice::Armed);
    }

    #[test]
    fn test_missing_marker_keeps_flag() {
        let (notices, gate) = gate();
        notices.arm().unwrap();
        let nonce = fixtures::nonce_service().create(NonceAction::ResetSuccess, &fixtures::administrator());
        let ctx = fixtures::admin_request("reset-success=done")
            .with_query(RESET_SUCCESS_NONCE_PARAM, nonce.into_inner());

        assert_eq!(gate.check(&ctx).unwrap(), None);
        assert_eq!(notices.state().unwrap(), ResetNotice::Armed);
    }

    #[test]
    fn test_css_classes() {
        assert_eq!(
            AdminNotice::reset_success().css_classes(),
            "notice notice-success is-dismissible"
        );
    }
}
