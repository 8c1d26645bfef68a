//! End-to-end admin flows over a shared option store.

use std::sync::Arc;

use aspireupdate_admin::{
    AdminController, AdminUrls, FieldKind, RejectReason, RequestFlow, ResetNotice,
    ResetNoticeStore, SaveOutcome, FORM_NONCE_FIELD,
};
use aspireupdate_config::{
    OverrideKey, OverrideRegistry, StaticOverrideSource, StoredSettings, DEFAULT_API_HOST,
    RESET_NOTICE_OPTION, SETTINGS_OPTION,
};
use aspireupdate_core::{
    fixtures, AdminIdentity, AdminRequest, InMemoryStore, JsonFileStore, NonceAction,
    NonceVerifier, OptionStore,
};
use http::StatusCode;
use serde_json::json;

fn controller_over(store: Arc<dyn OptionStore>) -> AdminController {
    AdminController::new(
        store,
        Arc::new(OverrideRegistry::empty()),
        Arc::new(fixtures::nonce_service()),
        AdminUrls::new("https://example.org/wp-admin/").unwrap(),
    )
}

fn customized_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::with_options([(
        SETTINGS_OPTION,
        json!({
            "enable": true,
            "api_key": "secret",
            "api_host": "other",
            "api_host_other": "mirror.example.org",
            "enable_debug": true,
            "enable_debug_type": { "request": true },
        }),
    )]))
}

fn reset_request(identity: &AdminIdentity) -> AdminRequest {
    let nonce = fixtures::nonce_service().create(NonceAction::Reset, identity);
    AdminRequest::new(identity.clone())
        .with_query("page", "aspireupdate-settings")
        .with_query("reset", "reset")
        .with_query("reset-nonce", nonce.into_inner())
}

fn follow(location: &str, identity: &AdminIdentity) -> AdminRequest {
    let query = location.split_once('?').map_or("", |(_, q)| q);
    AdminRequest::from_query_string(identity.clone(), query)
}

#[test]
fn test_reset_then_notice_shows_once() {
    let store = customized_store();
    let controller = controller_over(store.clone());
    let admin = fixtures::administrator();

    let flow = controller
        .on_admin_init(&reset_request(&admin), &controller.resolver())
        .unwrap();
    let RequestFlow::Exit(redirect) = flow else {
        panic!("expected redirect");
    };
    assert_eq!(redirect.status(), StatusCode::FOUND);
    assert!(redirect
        .location()
        .starts_with("https://example.org/wp-admin/index.php?page=aspireupdate-settings&reset-success=success&reset-success-nonce="));

    let resolver = controller.resolver();
    assert!(!resolver.is_enabled().unwrap());
    assert_eq!(resolver.api_host().unwrap(), DEFAULT_API_HOST);
    assert_eq!(resolver.api_key().unwrap(), "");

    let landing = follow(redirect.location(), &admin);
    let notice = controller.on_admin_notices(&landing).unwrap().unwrap();
    assert_eq!(notice.message, "Settings have been reset to default.");
    assert_eq!(notice.css_classes(), "notice notice-success is-dismissible");

    assert_eq!(controller.on_admin_notices(&landing).unwrap(), None);
    assert_eq!(store.get(RESET_NOTICE_OPTION).unwrap(), None);
}

#[test]
fn test_reset_is_idempotent() {
    let store = customized_store();
    let controller = controller_over(store.clone());
    let admin = fixtures::administrator();

    for _ in 0..2 {
        let flow = controller
            .on_admin_init(&reset_request(&admin), &controller.resolver())
            .unwrap();
        assert!(matches!(flow, RequestFlow::Exit(_)));
        assert_eq!(
            StoredSettings::from_value(store.get(SETTINGS_OPTION).unwrap().unwrap()).unwrap(),
            StoredSettings::defaults()
        );
        assert_eq!(
            ResetNoticeStore::new(store.clone()).state().unwrap(),
            ResetNotice::Armed
        );
    }
}

#[test]
fn test_invalid_reset_nonce_changes_nothing() {
    let store = customized_store();
    let before = store.get(SETTINGS_OPTION).unwrap();
    let controller = controller_over(store.clone());

    let ctx = fixtures::admin_request("reset=reset&reset-nonce=deadbeefdeadbeefdead");
    let flow = controller.on_admin_init(&ctx, &controller.resolver()).unwrap();

    assert_eq!(flow, RequestFlow::Continue);
    assert_eq!(store.get(SETTINGS_OPTION).unwrap(), before);
    assert_eq!(store.get(RESET_NOTICE_OPTION).unwrap(), None);
    assert_eq!(controller.on_admin_notices(&ctx).unwrap(), None);
}

#[test]
fn test_reset_nonce_from_another_user_is_rejected() {
    let store = customized_store();
    let before = store.get(SETTINGS_OPTION).unwrap();
    let controller = controller_over(store.clone());

    let other_admin = AdminIdentity::administrator(7, "other-session");
    let nonce = fixtures::nonce_service().create(NonceAction::Reset, &other_admin);
    let ctx = fixtures::admin_request("reset=reset").with_query("reset-nonce", nonce.into_inner());

    assert_eq!(
        controller.on_admin_init(&ctx, &controller.resolver()).unwrap(),
        RequestFlow::Continue
    );
    assert_eq!(store.get(SETTINGS_OPTION).unwrap(), before);
}

#[test]
fn test_notice_needs_the_resetting_session() {
    let store = customized_store();
    let controller = controller_over(store.clone());
    let admin = fixtures::administrator();

    let RequestFlow::Exit(redirect) = controller
        .on_admin_init(&reset_request(&admin), &controller.resolver())
        .unwrap()
    else {
        panic!("expected redirect");
    };

    let stranger = AdminIdentity::administrator(9, "stranger-session");
    assert_eq!(
        controller.on_admin_notices(&follow(redirect.location(), &stranger)).unwrap(),
        None
    );
    assert!(controller
        .on_admin_notices(&follow(redirect.location(), &admin))
        .unwrap()
        .is_some());
}

#[test]
fn test_save_then_reset_through_the_page() {
    let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());
    let controller = controller_over(store.clone());
    let admin = fixtures::administrator();
    let ctx = AdminRequest::new(admin.clone());

    let page = controller.settings_page(&ctx, &controller.resolver()).unwrap();
    assert!(store.get(SETTINGS_OPTION).unwrap().is_some());

    let body = json!({
        FORM_NONCE_FIELD: page.form_nonce.as_str(),
        SETTINGS_OPTION: {
            "enable": "1",
            "api_host": "other",
            "api_host_other": "updates.example.net",
            "enable_debug_type": ["response", "bogus"],
        },
    });
    let SaveOutcome::Saved(saved) = controller
        .save_settings(&ctx, &body, &controller.resolver())
        .unwrap()
    else {
        panic!("expected save");
    };
    assert_eq!(saved.enable_debug_type.len(), 1);
    assert_eq!(controller.resolver().api_host().unwrap(), "updates.example.net");

    let reloaded = controller.settings_page(&ctx, &controller.resolver()).unwrap();
    let Some(FieldKind::Hosts { selected, other, .. }) =
        reloaded.field("api_host").map(|f| f.kind.clone())
    else {
        panic!("api_host is a host select");
    };
    assert_eq!((selected.as_str(), other.as_str()), ("other", "updates.example.net"));

    let query = reloaded.reset_url.split_once('?').unwrap().1;
    let flow = controller
        .on_admin_init(&AdminRequest::from_query_string(admin, query), &controller.resolver())
        .unwrap();
    assert!(matches!(flow, RequestFlow::Exit(_)));
    assert_eq!(controller.resolver().api_host().unwrap(), DEFAULT_API_HOST);
}

#[test]
fn test_subscriber_cannot_save_or_reset() {
    let store = customized_store();
    let before = store.get(SETTINGS_OPTION).unwrap();
    let controller = controller_over(store.clone());
    let subscriber = fixtures::subscriber();

    let flow = controller
        .on_admin_init(&reset_request(&subscriber), &controller.resolver())
        .unwrap();
    assert_eq!(flow, RequestFlow::Continue);

    let nonce = fixtures::nonce_service().create(NonceAction::SaveSettings, &subscriber);
    let outcome = controller
        .save_settings(
            &AdminRequest::new(subscriber),
            &json!({ FORM_NONCE_FIELD: nonce.as_str(), SETTINGS_OPTION: {} }),
            &controller.resolver(),
        )
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Rejected(RejectReason::Forbidden));
    assert_eq!(store.get(SETTINGS_OPTION).unwrap(), before);
}

#[test]
fn test_overrides_survive_reset() {
    let store = customized_store();
    let controller = AdminController::new(
        store,
        Arc::new(OverrideRegistry::new(
            StaticOverrideSource::new()
                .flag(OverrideKey::Enable, true)
                .text(OverrideKey::Host, "pinned.example.org"),
        )),
        Arc::new(fixtures::nonce_service()),
        AdminUrls::default(),
    );

    let flow = controller
        .on_admin_init(&reset_request(&fixtures::administrator()), &controller.resolver())
        .unwrap();
    assert!(matches!(flow, RequestFlow::Exit(_)));

    let resolver = controller.resolver();
    assert!(resolver.is_enabled().unwrap());
    assert_eq!(resolver.api_host().unwrap(), "pinned.example.org");
}

#[test]
fn test_reset_over_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("options.json");
    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    store
        .set(SETTINGS_OPTION, json!({ "enable": true, "api_host": "other", "api_host_other": "x.example" }))
        .unwrap();
    let controller = controller_over(store);

    let flow = controller
        .on_admin_init(&reset_request(&fixtures::administrator()), &controller.resolver())
        .unwrap();
    assert!(matches!(flow, RequestFlow::Exit(_)));

    let reopened = JsonFileStore::open(&path).unwrap();
    assert_eq!(
        reopened.get(RESET_NOTICE_OPTION).unwrap(),
        Some(json!("true"))
    );
    assert_eq!(
        StoredSettings::from_value(reopened.get(SETTINGS_OPTION).unwrap().unwrap()).unwrap(),
        StoredSettings::defaults()
    );
}
