//! # AspireUpdate Admin
//!
//! Admin-side workflows for the AspireUpdate settings page.
//!
//! - [`ResetWorkflow`] - Nonce-protected reset to defaults, ending in a redirect
//! - [`NotificationGate`] - Shows the reset confirmation exactly once
//! - [`SettingsPage`] / [`SettingsForm`] - Field descriptors and the save path
//! - [`AdminController`] - One entry point per host hook
//!
//! Markup, menus and HTTP transport belong to the host. This crate decides
//! what happens and returns plain values ([`RequestFlow`], [`AdminNotice`],
//! [`SettingsPage`]) for the host to act on.
//!
//! ## Reset round trip
//!
//! ```
//! use std::sync::Arc;
//! use aspireupdate_admin::{AdminController, AdminUrls, RequestFlow};
//! use aspireupdate_config::OverrideRegistry;
//! use aspireupdate_core::{fixtures, AdminRequest, InMemoryStore};
//!
//! let controller = AdminController::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(OverrideRegistry::empty()),
//!     Arc::new(fixtures::nonce_service()),
//!     AdminUrls::default(),
//! );
//! let admin = fixtures::administrator();
//!
//! // The reset link from the settings page.
//! let page = controller
//!     .settings_page(&AdminRequest::new(admin.clone()), &controller.resolver())
//!     .unwrap();
//! let query = page.reset_url.split_once('?').unwrap().1;
//!
//! let RequestFlow::Exit(redirect) = controller
//!     .on_admin_init(&AdminRequest::from_query_string(admin.clone(), query), &controller.resolver())
//!     .unwrap()
//! else {
//!     panic!("reset should redirect");
//! };
//!
//! // Following the redirect shows the notice once.
//! let query = redirect.location().split_once('?').unwrap().1;
//! let landing = AdminRequest::from_query_string(admin, query);
//! assert!(controller.on_admin_notices(&landing).unwrap().is_some());
//! assert!(controller.on_admin_notices(&landing).unwrap().is_none());
//! ```

#![doc(html_root_url = "https://docs.rs/aspireupdate-admin/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod controller;
mod error;
pub mod form;
pub mod notice;
pub mod reset;
mod urls;

pub use controller::{AdminController, AdminHooks, ScriptData, SubmenuPage, SETTINGS_PAGE_HOOK};
pub use error::{AdminError, AdminResult};
pub use form::{
    CheckboxOption, FieldDescriptor, FieldKind, FieldRenderer, RejectReason, SaveOutcome,
    SettingsForm, SettingsPage, SettingsSection, FORM_NONCE_FIELD,
};
pub use notice::{AdminNotice, NoticeLevel, NotificationGate, ResetNotice, ResetNoticeStore};
pub use reset::{Redirect, RequestFlow, ResetWorkflow};
pub use urls::{AdminUrls, AJAX_SCRIPT, PARENT_SLUG, SETTINGS_PAGE_SLUG};
