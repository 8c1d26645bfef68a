//! Admin page URLs.

use url::form_urlencoded;
use url::Url;

use crate::error::{AdminError, AdminResult};

/// Slug of the settings page.
pub const SETTINGS_PAGE_SLUG: &str = "aspireupdate-settings";

/// Admin script the settings page hangs under.
pub const PARENT_SLUG: &str = "index.php";

/// Script that handles in-page asynchronous requests.
pub const AJAX_SCRIPT: &str = "admin-ajax.php";

/// Builds links to the settings page under an admin base URL.
///
/// The base may be absolute (`https://example.org/wp-admin/`) or
/// root-relative (`/wp-admin/`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUrls {
    base: String,
}

impl AdminUrls {
    /// Creates URLs under `base`, adding a trailing slash if missing.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::InvalidUrl` if `base` is neither an absolute
    /// http(s) URL nor a root-relative path.
    pub fn new(base: impl Into<String>) -> AdminResult<Self> {
        let mut base = base.into();
        if base.starts_with("//") {
            return Err(AdminError::invalid_url(base, "protocol-relative URLs are not allowed"));
        }
        if !base.starts_with('/') {
            let parsed = Url::parse(&base).map_err(|e| AdminError::invalid_url(base.clone(), e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AdminError::invalid_url(base, "scheme must be http or https"));
            }
        }
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self { base })
    }

    /// Returns the base URL.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The settings page URL with extra query parameters appended.
    pub fn settings_page(&self, params: &[(&str, &str)]) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", SETTINGS_PAGE_SLUG);
        for (key, value) in params {
            query.append_pair(key, value);
        }
        format!("{}{}?{}", self.base, PARENT_SLUG, query.finish())
    }

    /// The asynchronous request endpoint.
    pub fn ajax(&self) -> String {
        format!("{}{AJAX_SCRIPT}", self.base)
    }
}

impl Default for AdminUrls {
    fn default() -> Self {
        Self {
            base: "/wp-admin/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ajax_url() {
        let urls = AdminUrls::new("https://example.org/wp-admin").unwrap();
        assert_eq!(urls.ajax(), "https://example.org/wp-admin/admin-ajax.php");
    }

    #[test]
    fn test_settings_page_url() {
        let urls = AdminUrls::default();
        assert_eq!(
            urls.settings_page(&[]),
            "/wp-admin/index.php?page=aspireupdate-settings"
        );
    }

    #[test]
    fn test_params_are_encoded() {
        let urls = AdminUrls::new("https://example.org/wp-admin").unwrap();
        assert_eq!(urls.base(), "https://example.org/wp-admin/");
        assert_eq!(
            urls.settings_page(&[("reset", "reset"), ("note", "a b&c")]),
            "https://example.org/wp-admin/index.php?page=aspireupdate-settings&reset=reset&note=a+b%26c"
        );
    }

    #[test]
    fn test_rejects_bad_bases() {
        assert!(AdminUrls::new("wp-admin/").is_err());
        assert!(AdminUrls::new("//evil.example/").is_err());
        assert!(AdminUrls::new("javascript:alert(1)").is_err());
    }
}
