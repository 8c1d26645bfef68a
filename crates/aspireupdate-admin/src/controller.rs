//! Admin controller.
//!
//! [`AdminController`] owns the admin workflows and exposes one method per
//! host hook:
//!
//! | Hook | Method |
//! |------|--------|
//! | admin menu | [`AdminController::register_admin_menu`] |
//! | admin init | [`AdminController::on_admin_init`] |
//! | admin notices | [`AdminController::on_admin_notices`] |
//! | asset enqueue | [`AdminController::script_data`] |
//! | page render | [`AdminController::settings_page`] |
//! | form post | [`AdminController::save_settings`] |
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use aspireupdate_admin::{AdminController, AdminUrls, RequestFlow};
//! use aspireupdate_config::OverrideRegistry;
//! use aspireupdate_core::{fixtures, InMemoryStore};
//!
//! let controller = AdminController::new(
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(OverrideRegistry::empty()),
//!     Arc::new(fixtures::nonce_service()),
//!     AdminUrls::default(),
//! );
//!
//! let ctx = fixtures::admin_request("page=aspireupdate-settings");
//! let resolver = controller.resolver();
//! assert_eq!(controller.on_admin_init(&ctx, &resolver).unwrap(), RequestFlow::Continue);
//! assert!(controller.on_admin_notices(&ctx).unwrap().is_none());
//! ```

use std::sync::Arc;

use aspireupdate_config::{OverrideRegistry, SettingsResolver};
use aspireupdate_core::{AdminRequest, Capability, NonceAction, NonceVerifier, OptionStore};
use serde::Serialize;
use serde_json::Value;

use crate::error::AdminResult;
use crate::form::{SaveOutcome, SettingsForm, SettingsPage};
use crate::notice::{AdminNotice, NotificationGate, ResetNoticeStore};
use crate::reset::{RequestFlow, ResetWorkflow};
use crate::urls::{AdminUrls, PARENT_SLUG, SETTINGS_PAGE_SLUG};

/// Hook suffix the host reports when the settings page is being loaded.
pub const SETTINGS_PAGE_HOOK: &str = "dashboard_page_aspireupdate-settings";

/// A submenu entry to register with the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmenuPage {
    /// Parent menu script.
    pub parent_slug: &'static str,
    /// Browser title.
    pub page_title: &'static str,
    /// Menu label.
    pub menu_title: &'static str,
    /// Capability needed to see the entry.
    pub capability: Capability,
    /// Page slug.
    pub menu_slug: &'static str,
}

impl SubmenuPage {
    /// The settings page entry.
    pub fn settings() -> Self {
        Self {
            parent_slug: PARENT_SLUG,
            page_title: "AspireUpdate",
            menu_title: "AspireUpdate",
            capability: Capability::ManageOptions,
            menu_slug: SETTINGS_PAGE_SLUG,
        }
    }
}

/// Registration surface of the host's admin menu.
pub trait AdminHooks {
    /// Adds a page under an existing top-level menu.
    fn add_submenu_page(&mut self, page: SubmenuPage);
}

/// Data handed to the settings page script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptData {
    /// Endpoint for asynchronous requests.
    pub ajax_url: String,
    /// Nonce for [`NonceAction::Ajax`].
    pub nonce: String,
}

/// Wires the admin workflows to host hooks.
#[derive(Clone)]
pub struct AdminController {
    store: Arc<dyn OptionStore>,
    overrides: Arc<OverrideRegistry>,
    nonces: Arc<dyn NonceVerifier>,
    urls: AdminUrls,
    reset: ResetWorkflow,
    gate: NotificationGate,
    form: SettingsForm,
}

impl std::fmt::Debug for AdminController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminController")
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl AdminController {
    /// Creates a controller over the host's option store.
    pub fn new(
        store: Arc<dyn OptionStore>,
        overrides: Arc<OverrideRegistry>,
        nonces: Arc<dyn NonceVerifier>,
        urls: AdminUrls,
    ) -> Self {
        let notices = ResetNoticeStore::new(store.clone());
        Self {
            reset: ResetWorkflow::new(notices.clone(), nonces.clone(), urls.clone()),
            gate: NotificationGate::new(notices, nonces.clone()),
            form: SettingsForm::new(nonces.clone()),
            store,
            overrides,
            nonces,
            urls,
        }
    }

    /// A fresh resolver for one request.
    pub fn resolver(&self) -> SettingsResolver {
        SettingsResolver::new(self.store.clone(), self.overrides.clone())
    }

    /// Admin URLs.
    pub fn urls(&self) -> &AdminUrls {
        &self.urls
    }

    /// Registers the settings page unless `AP_REMOVE_UI` hides it.
    ///
    /// Returns whether the page was registered.
    pub fn register_admin_menu(&self, hooks: &mut dyn AdminHooks) -> bool {
        if self.overrides.remove_ui() {
            tracing::debug!("Settings page hidden by deployment override");
            return false;
        }
        hooks.add_submenu_page(SubmenuPage::settings());
        true
    }

    /// Runs the reset workflow.
    ///
    /// When this returns [`RequestFlow::Exit`] the host must send the
    /// redirect and end the request.
    pub fn on_admin_init(&self, ctx: &AdminRequest, resolver: &SettingsResolver) -> AdminResult<RequestFlow> {
        self.reset.handle(ctx, resolver)
    }

    /// The notice to display at the top of this admin page, if any.
    pub fn on_admin_notices(&self, ctx: &AdminRequest) -> AdminResult<Option<AdminNotice>> {
        self.gate.check(ctx)
    }

    /// Script data for the settings page; `None` on every other page.
    pub fn script_data(&self, ctx: &AdminRequest, hook: &str) -> Option<ScriptData> {
        (hook == SETTINGS_PAGE_HOOK).then(|| ScriptData {
            ajax_url: self.urls.ajax(),
            nonce: self.nonces.create(NonceAction::Ajax, ctx.identity()).into_inner(),
        })
    }

    /// The settings page model for `ctx`'s caller.
    pub fn settings_page(&self, ctx: &AdminRequest, resolver: &SettingsResolver) -> AdminResult<SettingsPage> {
        SettingsPage::build(ctx, resolver, self.nonces.as_ref(), self.reset.reset_url(ctx))
    }

    /// Handles a settings form post.
    pub fn save_settings(
        &self,
        ctx: &AdminRequest,
        raw: &Value,
        resolver: &SettingsResolver,
    ) -> AdminResult<SaveOutcome> {
        self.form.submit(ctx, raw, resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aspireupdate_config::{OverrideKey, StaticOverrideSource};
    use aspireupdate_core::{fixtures, InMemoryStore};

    #[derive(Default)]
    struct RecordingMenu(Vec<SubmenuPage>);

    impl AdminHooks for RecordingMenu {
        fn add_submenu_page(&mut self, page: SubmenuPage) {
            self.0.push(page);
        }
    }

    fn controller(overrides: OverrideRegistry) -> AdminController {
        AdminController::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(overrides),
            Arc::new(fixtures::nonce_service()),
            AdminUrls::default(),
        )
    }

    #[test]
    fn test_registers_settings_page() {
        let mut menu = RecordingMenu::default();
        assert!(controller(OverrideRegistry::empty()).register_admin_menu(&mut menu));
        assert_eq!(menu.0, vec![SubmenuPage::settings()]);
        assert_eq!(menu.0[0].parent_slug, "index.php");
        assert_eq!(menu.0[0].menu_slug, "aspireupdate-settings");
        assert_eq!(menu.0[0].capability, Capability::ManageOptions);
    }

    #[test]
    fn test_remove_ui_hides_page() {
        let overrides =
            OverrideRegistry::new(StaticOverrideSource::new().flag(OverrideKey::RemoveUi, true));
        let mut menu = RecordingMenu::default();
        assert!(!controller(overrides).register_admin_menu(&mut menu));
        assert!(menu.0.is_empty());
    }

    #[test]
    fn test_remove_ui_false_keeps_page() {
        let overrides =
            OverrideRegistry::new(StaticOverrideSource::new().flag(OverrideKey::RemoveUi, false));
        let mut menu = RecordingMenu::default();
        assert!(controller(overrides).register_admin_menu(&mut menu));
    }

    #[test]
    fn test_script_data_only_on_settings_page() {
        let controller = controller(OverrideRegistry::empty());
        let ctx = fixtures::admin_request("");

        assert_eq!(controller.script_data(&ctx, "index.php"), None);

        let data = controller.script_data(&ctx, SETTINGS_PAGE_HOOK).unwrap();
        assert_eq!(data.ajax_url, "/wp-admin/admin-ajax.php");
        assert!(fixtures::nonce_service()
            .verify(NonceAction::Ajax, &fixtures::administrator(), &data.nonce)
            .is_some());
    }

    #[test]
    fn test_settings_page_links_to_reset() {
        let controller = controller(OverrideRegistry::empty());
        let ctx = fixtures::admin_request("page=aspireupdate-settings");
        let page = controller.settings_page(&ctx, &controller.resolver()).unwrap();

        assert!(page
            .reset_url
            .starts_with("/wp-admin/index.php?page=aspireupdate-settings&reset=reset&reset-nonce="));
    }
}
