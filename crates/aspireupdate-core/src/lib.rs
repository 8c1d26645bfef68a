//! # AspireUpdate Core
//!
//! Core types shared by the AspireUpdate settings crates.
//!
//! This crate provides the foundational types used throughout AspireUpdate:
//!
//! - [`AdminRequest`] - Per-request context carrying the admin identity and query parameters
//! - [`RequestId`] - UUID v7 request identifier
//! - [`AdminIdentity`] - The caller as authenticated by the host application
//! - [`NonceVerifier`] / [`HmacNonceService`] - Action-scoped request nonces
//! - [`OptionStore`] - The host's key/value option persistence contract
//! - [`CoreError`] - Standard error types

#![doc(html_root_url = "https://docs.rs/aspireupdate-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
pub mod fixtures;
mod identity;
pub mod nonce;
pub mod store;

pub use context::{AdminRequest, RequestId};
pub use error::{CoreError, CoreResult, ErrorCategory};
pub use identity::{AdminIdentity, Capability};
pub use nonce::{HmacNonceService, Nonce, NonceAction, NonceAge, NonceVerifier};
pub use store::{InMemoryStore, JsonFileStore, OptionStore, StoreError};
