//! Test fixtures for AspireUpdate development and testing.
//!
//! Pre-built identities, requests and a deterministic nonce service that can be
//! used in tests across the workspace.
//!
//! # Example
//!
//! ```
//! use aspireupdate_core::fixtures;
//! use aspireupdate_core::{NonceAction, NonceVerifier};
//!
//! let nonces = fixtures::nonce_service();
//! let admin = fixtures::administrator();
//! let nonce = nonces.create(NonceAction::Reset, &admin);
//! assert!(nonces.verify(NonceAction::Reset, &admin, nonce.as_str()).is_some());
//! ```

use crate::context::AdminRequest;
use crate::identity::AdminIdentity;
use crate::nonce::HmacNonceService;

/// Fixed secret used by [`nonce_service`].
pub const TEST_SECRET: [u8; 32] = *b"aspireupdate-test-secret-32bytes";

/// A nonce service with a fixed secret.
#[must_use]
pub fn nonce_service() -> HmacNonceService {
    match HmacNonceService::new(TEST_SECRET) {
        Ok(service) => service,
        Err(e) => unreachable!("fixture secret is 32 bytes: {e}"),
    }
}

/// User 1 with `manage_options`.
#[must_use]
pub fn administrator() -> AdminIdentity {
    AdminIdentity::administrator(1, "admin-session")
}

/// User 2 without `manage_options`.
#[must_use]
pub fn subscriber() -> AdminIdentity {
    AdminIdentity::user(2, "subscriber-session")
}

/// A request from [`administrator`] carrying `query`.
#[must_use]
pub fn admin_request(query: &str) -> AdminRequest {
    AdminRequest::from_query_string(administrator(), query)
}
