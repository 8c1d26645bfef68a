//! Sanitization of submitted settings.
//!
//! [`sanitize`] turns untrusted form data into a [`StoredSettings`] record. It
//! never fails: anything malformed degrades to the empty value for its field.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::schema::{truthy, DebugType, StoredSettings};

/// Sanitizes a submitted settings form.
///
/// Unchecked checkboxes are omitted by browsers, so an absent flag is `false`.
/// A non-object input yields the all-empty record.
#[must_use]
pub fn sanitize(raw: &Value) -> StoredSettings {
    let Value::Object(input) = raw else {
        return StoredSettings::default();
    };

    StoredSettings {
        enable: flag(input, "enable"),
        api_key: text(input, "api_key"),
        api_host: text(input, "api_host"),
        api_host_other: text(input, "api_host_other"),
        enable_debug: flag(input, "enable_debug"),
        enable_debug_type: debug_types(input.get("enable_debug_type")),
        disable_ssl_verification: flag(input, "disable_ssl_verification"),
    }
}

/// Reduces a string to single-line plain text.
///
/// Strips markup tags (including the bodies of `script` and `style`
/// elements), percent-encoded octets, and control characters; collapses
/// whitespace runs to one space and trims the ends.
#[must_use]
pub fn sanitize_text_field(input: &str) -> String {
    let without_blocks = script_blocks().replace_all(input, "");
    let mut text = tags().replace_all(&without_blocks, "").into_owned();

    // Stripping an octet or a control character can splice a new octet
    // together, so repeat until none is left.
    loop {
        while octets().is_match(&text) {
            text = octets().replace_all(&text, "").into_owned();
        }
        let cleaned = collapse_whitespace(&text);
        if !octets().is_match(&cleaned) {
            return cleaned.replace('<', "&lt;");
        }
        text = cleaned;
    }
}

fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    for c in input.chars() {
        if c.is_whitespace() {
            pending_space = true;
        } else if !c.is_control() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
    }
    out
}

fn flag(input: &Map<String, Value>, key: &str) -> bool {
    input.get(key).is_some_and(truthy)
}

fn text(input: &Map<String, Value>, key: &str) -> String {
    input.get(key).map(text_value).unwrap_or_default()
}

fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => sanitize_text_field(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        _ => String::new(),
    }
}

fn debug_types(raw: Option<&Value>) -> BTreeMap<String, bool> {
    let names: Vec<String> = match raw {
        Some(Value::Array(items)) => items.iter().map(text_value).collect(),
        Some(Value::Object(map)) if is_list_like(map) => map.values().map(text_value).collect(),
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, checked)| truthy(checked))
            .map(|(name, _)| sanitize_text_field(name))
            .collect(),
        _ => Vec::new(),
    };

    names
        .iter()
        .filter_map(|name| name.parse::<DebugType>().ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|kind| (kind.as_str().to_string(), true))
        .collect()
}

fn is_list_like(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|k| k.parse::<u32>().is_ok())
}

fn script_blocks() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script[^>]*>.*?</script\s*>|<style[^>]*>.*?</style\s*>").expect("valid regex")
    })
}

fn tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

fn octets() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%[a-fA-F0-9]{2}").expect("valid regex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_checkbox_semantics() {
        let stored = sanitize(&json!({
            "enable": "1",
            "enable_debug": "0",
        }));
        assert!(stored.enable);
        assert!(!stored.enable_debug);
        assert!(!stored.disable_ssl_verification);
    }

    #[test]
    fn test_text_fields() {
        let stored = sanitize(&json!({
            "api_key": "  abc<b>def</b>\n",
            "api_host": "other",
            "api_host_other": "mirror.\u{0007}example.org",
        }));
        assert_eq!(stored.api_key, "abcdef");
        assert_eq!(stored.api_host, "other");
        assert_eq!(stored.api_host_other, "mirror.example.org");
    }

    #[test]
    fn test_non_string_text_fields() {
        let stored = sanitize(&json!({ "api_key": 1234, "api_host": ["x"] }));
        assert_eq!(stored.api_key, "1234");
        assert_eq!(stored.api_host, "");
    }

    #[test]
    fn test_sanitize_text_field() {
        assert_eq!(sanitize_text_field("a\t\tb   c"), "a b c");
        assert_eq!(sanitize_text_field("<script>alert(1)</script>key"), "key");
        assert_eq!(sanitize_text_field("100%20off"), "100off");
        assert_eq!(sanitize_text_field("a < b"), "a &lt; b");
        assert_eq!(sanitize_text_field("   "), "");
    }

    #[test]
    fn test_debug_types_from_checkbox_group() {
        let stored = sanitize(&json!({
            "enable_debug_type": { "request": "1", "response": "", "bogus": "1" }
        }));
        assert_eq!(stored.enable_debug_type, [("request".to_string(), true)].into());
    }

    #[test]
    fn test_debug_types_from_list() {
        let stored = sanitize(&json!({
            "enable_debug_type": ["String", "request", "request", 7, "<i>response</i>"]
        }));
        let names: Vec<&str> = stored.enable_debug_type.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["request", "response", "string"]);
    }

    #[test]
    fn test_debug_types_from_indexed_map() {
        let stored = sanitize(&json!({
            "enable_debug_type": { "0": "response", "1": "string" }
        }));
        let names: Vec<&str> = stored.enable_debug_type.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["response", "string"]);
    }

    #[test]
    fn test_debug_types_scalar_is_empty() {
        let stored = sanitize(&json!({ "enable_debug_type": "request" }));
        assert!(stored.enable_debug_type.is_empty());
    }

    #[test]
    fn test_nested_octets_are_fully_removed() {
        assert_eq!(sanitize_text_field("%%3C3C"), "");
        assert_eq!(sanitize_text_field("key%%4141"), "key");
        assert_eq!(sanitize_text_field("a%4\u{7}1b"), "ab");
        assert_eq!(sanitize_text_field("a %41 b"), "a b");
    }

    #[test]
    fn test_non_object_input() {
        assert_eq!(sanitize(&json!(null)), StoredSettings::default());
        assert_eq!(sanitize(&json!([1, 2, 3])), StoredSettings::default());
        assert_eq!(sanitize(&json!("enable")), StoredSettings::default());
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            ".*".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map(
                    prop_oneof![
                        Just("enable".to_string()),
                        Just("api_key".to_string()),
                        Just("api_host".to_string()),
                        Just("api_host_other".to_string()),
                        Just("enable_debug".to_string()),
                        Just("enable_debug_type".to_string()),
                        Just("disable_ssl_verification".to_string()),
                        ".*",
                    ],
                    inner,
                    0..8
                )
                .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn sanitize_is_total_and_well_formed(raw in arb_json()) {
            let stored = sanitize(&raw);
            for text in [&stored.api_key, &stored.api_host, &stored.api_host_other] {
                prop_assert_eq!(text.trim(), text.as_str());
                prop_assert!(!text.chars().any(char::is_control));
                prop_assert!(!text.contains("  "));
                prop_assert!(!octets().is_match(text));
            }
            for (name, enabled) in &stored.enable_debug_type {
                prop_assert!(*enabled);
                prop_assert!(name.parse::<DebugType>().is_ok());
            }
        }

        #[test]
        fn sanitize_text_field_has_no_tags(input in ".*") {
            let out = sanitize_text_field(&input);
            prop_assert!(!out.contains('<'));
            prop_assert_eq!(out.trim(), out.as_str());
        }

        #[test]
        fn sanitize_text_field_leaves_no_octets(input in "[%0-9a-fA-F \\x01k]{0,24}") {
            let out = sanitize_text_field(&input);
            prop_assert!(!octets().is_match(&out), "octet left in {:?}", out);
        }
    }
}
