//! Action-scoped request nonces.
//!
//! A nonce ties a URL or form to one action, one user session and a window of
//! time. The reset link, the post-reset redirect and the settings form each use
//! a different [`NonceAction`], so a value minted for one can never authorize
//! another.
//!
//! Hosts with their own nonce machinery implement [`NonceVerifier`]. The
//! bundled [`HmacNonceService`] uses HMAC-SHA256 over the action, the user,
//! the session token and a time tick.
//!
//! # Example
//!
//! ```
//! use aspireupdate_core::{AdminIdentity, HmacNonceService, NonceAction, NonceVerifier};
//!
//! let nonces = HmacNonceService::new(vec![7u8; 32]).unwrap();
//! let admin = AdminIdentity::administrator(1, "session");
//!
//! let nonce = nonces.create(NonceAction::Reset, &admin);
//! assert!(nonces.verify(NonceAction::Reset, &admin, nonce.as_str()).is_some());
//! assert!(nonces.verify(NonceAction::ResetSuccess, &admin, nonce.as_str()).is_none());
//! ```

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Serialize;
use sha2::Sha256;
use std::fmt;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};
use crate::identity::AdminIdentity;

type HmacSha256 = Hmac<Sha256>;

/// Number of MAC bytes kept in a nonce (rendered as 20 hex characters).
const NONCE_BYTES: usize = 10;

/// Minimum secret length accepted by [`HmacNonceService`].
pub const MIN_SECRET_LEN: usize = 32;

/// Default nonce lifetime.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// The action a nonce authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NonceAction {
    /// Triggering a settings reset.
    Reset,
    /// Displaying the one-time notice after a reset.
    ResetSuccess,
    /// Saving the settings form.
    SaveSettings,
    /// Script-initiated requests from the settings page.
    Ajax,
}

impl NonceAction {
    /// Returns the action string mixed into the MAC.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reset => "aspireupdate-reset-nonce",
            Self::ResetSuccess => "aspireupdate-reset-success-nonce",
            Self::SaveSettings => "aspireupdate-settings",
            Self::Ajax => "aspireupdate-ajax",
        }
    }
}

impl fmt::Display for NonceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A minted nonce value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Nonce(String);

impl Nonce {
    /// Returns the nonce as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the nonce and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How old a verified nonce is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    /// Minted in the current half of the lifetime.
    Fresh,
    /// Minted in the previous half of the lifetime.
    Aging,
}

/// Mints and checks action-scoped nonces.
pub trait NonceVerifier: Send + Sync {
    /// Mints a nonce for `action` bound to `identity`.
    fn create(&self, action: NonceAction, identity: &AdminIdentity) -> Nonce;

    /// Checks `nonce` for `action` and `identity`.
    ///
    /// Returns `None` when the nonce is malformed, expired, or was minted for
    /// a different action or session.
    fn verify(&self, action: NonceAction, identity: &AdminIdentity, nonce: &str)
        -> Option<NonceAge>;
}

/// HMAC-SHA256 nonce service.
///
/// Time is split into ticks of half the lifetime. A nonce is accepted during
/// the tick it was minted in and the tick after it.
#[derive(Clone)]
pub struct HmacNonceService {
    mac: HmacSha256,
    tick_secs: i64,
}

impl fmt::Debug for HmacNonceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacNonceService")
            .field("tick_secs", &self.tick_secs)
            .finish_non_exhaustive()
    }
}

impl HmacNonceService {
    /// Creates a service from a raw secret of at least [`MIN_SECRET_LEN`] bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> CoreResult<Self> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_LEN {
            return Err(CoreError::configuration(format!(
                "nonce secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| CoreError::configuration(format!("invalid nonce secret: {e}")))?;
        Ok(Self {
            mac,
            tick_secs: tick_secs_for(DEFAULT_LIFETIME),
        })
    }

    /// Creates a service from a hex-encoded secret.
    pub fn from_hex(secret: &str) -> CoreResult<Self> {
        let bytes = hex::decode(secret.trim()).map_err(|e| {
            CoreError::configuration_with_source("nonce secret is not valid hex", e)
        })?;
        Self::new(bytes)
    }

    /// Creates a service with a random secret.
    ///
    /// Nonces minted by this instance stop verifying when the process exits.
    pub fn generate() -> CoreResult<Self> {
        let mut secret = [0u8; MIN_SECRET_LEN];
        rand::rngs::OsRng.fill_bytes(&mut secret);
        Self::new(secret)
    }

    /// Sets the nonce lifetime. Values under two seconds are raised to two.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.tick_secs = tick_secs_for(lifetime);
        self
    }

    /// Mints a nonce as of `now`.
    #[must_use]
    pub fn create_at(
        &self,
        action: NonceAction,
        identity: &AdminIdentity,
        now: DateTime<Utc>,
    ) -> Nonce {
        let tag = self.tag(action, identity, self.tick(now));
        Nonce(hex::encode(&tag[..NONCE_BYTES]))
    }

    /// Checks a nonce as of `now`.
    #[must_use]
    pub fn verify_at(
        &self,
        action: NonceAction,
        identity: &AdminIdentity,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Option<NonceAge> {
        let candidate = hex::decode(nonce.trim()).ok()?;
        if candidate.len() != NONCE_BYTES {
            return None;
        }

        let tick = self.tick(now);
        if self.matches(action, identity, tick, &candidate) {
            return Some(NonceAge::Fresh);
        }
        if self.matches(action, identity, tick - 1, &candidate) {
            return Some(NonceAge::Aging);
        }
        None
    }

    fn tick(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.tick_secs)
    }

    fn keyed(&self, action: NonceAction, identity: &AdminIdentity, tick: i64) -> HmacSha256 {
        let (user_id, session) = identity.nonce_subject();
        let mut mac = self.mac.clone();
        mac.update(format!("{tick}|{action}|{user_id}|{session}").as_bytes());
        mac
    }

    fn tag(&self, action: NonceAction, identity: &AdminIdentity, tick: i64) -> Vec<u8> {
        self.keyed(action, identity, tick)
            .finalize()
            .into_bytes()
            .to_vec()
    }

    fn matches(
        &self,
        action: NonceAction,
        identity: &AdminIdentity,
        tick: i64,
        candidate: &[u8],
    ) -> bool {
        // Constant-time comparison against the leftmost bytes of the MAC.
        self.keyed(action, identity, tick)
            .verify_truncated_left(candidate)
            .is_ok()
    }
}

impl NonceVerifier for HmacNonceService {
    fn create(&self, action: NonceAction, identity: &AdminIdentity) -> Nonce {
        self.create_at(action, identity, Utc::now())
    }

    fn verify(
        &self,
        action: NonceAction,
        identity: &AdminIdentity,
        nonce: &str,
    ) -> Option<NonceAge> {
        self.verify_at(action, identity, nonce, Utc::now())
    }
}

fn tick_secs_for(lifetime: Duration) -> i64 {
    let half = lifetime.as_secs() / 2;
    i64::try_from(half).unwrap_or(i64::MAX).max(1)
}
