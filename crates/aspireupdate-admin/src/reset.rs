//! Settings reset workflow.
//!
//! The settings page links to itself with `reset=reset` and a trigger nonce.
//! When a request carries both, and the nonce verifies for the caller, the
//! stored record is replaced by the defaults, the reset notice is armed, and
//! the request ends in a redirect carrying a second nonce that authorizes the
//! confirmation notice. Any failed check leaves the request to continue
//! normally; these links are absent from almost every admin request, so a
//! rejection is not an error.

use std::sync::Arc;

use aspireupdate_config::SettingsResolver;
use aspireupdate_core::{AdminRequest, Capability, NonceAction, NonceVerifier};
use aspireupdate_telemetry::metrics;
use http::{header, StatusCode};

use crate::error::AdminResult;
use crate::notice::{
    ResetNoticeStore, RESET_SUCCESS_NONCE_PARAM, RESET_SUCCESS_PARAM, RESET_SUCCESS_VALUE,
};
use crate::urls::AdminUrls;

/// Query parameter triggering a reset.
pub const RESET_PARAM: &str = "reset";

/// Expected value of [`RESET_PARAM`].
pub const RESET_VALUE: &str = "reset";

/// Query parameter carrying the trigger nonce.
pub const RESET_NONCE_PARAM: &str = "reset-nonce";

/// A redirect the host must send before ending the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    location: String,
    status: StatusCode,
}

impl Redirect {
    /// A `302 Found` redirect to `location`.
    pub fn found(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            status: StatusCode::FOUND,
        }
    }

    /// Target URL.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Builds an empty-bodied HTTP response.
    pub fn into_response(self) -> AdminResult<http::Response<()>> {
        Ok(http::Response::builder()
            .status(self.status)
            .header(header::LOCATION, self.location)
            .body(())?)
    }
}

/// What the host should do after an admin hook runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestFlow {
    /// Carry on handling the request.
    Continue,
    /// Send the redirect and stop; nothing else may be written.
    Exit(Redirect),
}

/// Handles reset requests.
#[derive(Clone)]
pub struct ResetWorkflow {
    notices: ResetNoticeStore,
    nonces: Arc<dyn NonceVerifier>,
    urls: AdminUrls,
}

impl std::fmt::Debug for ResetWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetWorkflow")
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl ResetWorkflow {
    /// Creates the workflow.
    pub fn new(notices: ResetNoticeStore, nonces: Arc<dyn NonceVerifier>, urls: AdminUrls) -> Self {
        Self {
            notices,
            nonces,
            urls,
        }
    }

    /// Runs the reset if `ctx` is a valid trigger.
    ///
    /// On success the settings record under `resolver` holds the defaults,
    /// the notice is armed, and the returned flow is
    /// [`RequestFlow::Exit`]. Otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `AdminError` only if the store fails during the reset itself.
    pub fn handle(&self, ctx: &AdminRequest, resolver: &SettingsResolver) -> AdminResult<RequestFlow> {
        if !ctx.query_equals(RESET_PARAM, RESET_VALUE) {
            return Ok(RequestFlow::Continue);
        }

        let action = NonceAction::Reset;
        let Some(nonce) = ctx.query(RESET_NONCE_PARAM) else {
            aspireupdate_telemetry::log_request_rejected!(ctx.request_id(), action, "missing nonce");
            return Ok(RequestFlow::Continue);
        };
        if !ctx.identity().can(&Capability::ManageOptions) {
            aspireupdate_telemetry::log_request_rejected!(ctx.request_id(), action, "missing capability");
            return Ok(RequestFlow::Continue);
        }
        if self.nonces.verify(action, ctx.identity(), nonce).is_none() {
            aspireupdate_telemetry::log_request_rejected!(ctx.request_id(), action, "invalid nonce");
            metrics::record_nonce_rejection(action.as_str());
            return Ok(RequestFlow::Continue);
        }

        resolver.repository().reset_to_defaults()?;
        resolver.invalidate();
        self.notices.arm()?;

        metrics::record_reset();
        aspireupdate_telemetry::log_settings_reset!(ctx.request_id(), ctx.identity().log_id());

        let display_nonce = self.nonces.create(NonceAction::ResetSuccess, ctx.identity());
        let location = self.urls.settings_page(&[
            (RESET_SUCCESS_PARAM, RESET_SUCCESS_VALUE),
            (RESET_SUCCESS_NONCE_PARAM, display_nonce.as_str()),
        ]);
        Ok(RequestFlow::Exit(Redirect::found(location)))
    }

    /// The trigger link shown on the settings page for `ctx`'s caller.
    pub fn reset_url(&self, ctx: &AdminRequest) -> String {
        let nonce = self.nonces.create(NonceAction::Reset, ctx.identity());
        self.urls
            .settings_page(&[(RESET_PARAM, RESET_VALUE), (RESET_NONCE_PARAM, nonce.as_str())])
    }
}
