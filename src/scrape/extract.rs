//! Recovery of the JSON documents embedded in server-rendered pages.
//!
//! The host inlines two documents into every page: a client configuration
//! object and an initial-state object. Both are found by anchored text
//! search followed by balanced-brace scanning, deliberately not a DOM
//! parse. The pages are megabytes of generated markup whose structure
//! drifts; a brace scan over raw text only depends on the anchor names,
//! which have historically been far more stable.

use serde_json::Value;

use crate::errors::{ExtractionKind, ScrapeError};

/// Anchor variants the config object has been published under.
const CONFIG_ANCHORS: &[&str] = &["ytcfg.set(", "window.ytcfg.set("];

/// Anchor variants for the initial-state object. Each has been observed in
/// the wild; all must be tried before giving up.
const STATE_ANCHORS: &[&str] = &[
    "var ytInitialData = ",
    "window[\"ytInitialData\"] = ",
    "window['ytInitialData'] = ",
    "ytInitialData = ",
];

/// Client configuration recovered from a page.
///
/// Immutable once extracted apart from the language override, which must be
/// applied before the first RPC call. Lives for one top-level operation and
/// is never persisted.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    raw: Value,
}

impl ClientConfig {
    /// API key replayed as a query parameter on RPC calls.
    pub fn api_key(&self) -> Option<&str> {
        self.raw.get("INNERTUBE_API_KEY").and_then(Value::as_str)
    }

    /// Client version replayed in the RPC context block.
    pub fn client_version(&self) -> Option<&str> {
        self.raw
            .get("INNERTUBE_CONTEXT_CLIENT_VERSION")
            .and_then(Value::as_str)
            .or_else(|| {
                self.raw
                    .pointer("/INNERTUBE_CONTEXT/client/clientVersion")
                    .and_then(Value::as_str)
            })
    }

    /// Visitor/session identifier, when the page carried one.
    pub fn visitor_data(&self) -> Option<&str> {
        self.raw
            .pointer("/INNERTUBE_CONTEXT/client/visitorData")
            .and_then(Value::as_str)
            .or_else(|| self.raw.get("VISITOR_DATA").and_then(Value::as_str))
    }

    /// The full client context block to replay on RPC calls.
    pub fn context(&self) -> Value {
        self.raw
            .get("INNERTUBE_CONTEXT")
            .cloned()
            .unwrap_or_else(|| {
                serde_json::json!({
                    "client": {
                        "clientName": "WEB",
                        "clientVersion": self.client_version().unwrap_or("2.20240101.00.00"),
                    }
                })
            })
    }

    /// Override the UI language the context will request.
    pub fn set_language(&mut self, language: &str) {
        if let Some(client) = self
            .raw
            .pointer_mut("/INNERTUBE_CONTEXT/client")
            .and_then(Value::as_object_mut)
        {
            client.insert("hl".to_string(), Value::String(language.to_string()));
        }
    }
}

/// Extract the client configuration object from page HTML.
pub fn extract_config(html: &str) -> Result<ClientConfig, ScrapeError> {
    extract_after_anchors(html, CONFIG_ANCHORS)
        .map(|raw| ClientConfig { raw })
        .ok_or(ScrapeError::Extraction {
            kind: ExtractionKind::Config,
        })
}

/// Extract the initial-state object from page HTML.
pub fn extract_initial_state(html: &str) -> Result<Value, ScrapeError> {
    extract_after_anchors(html, STATE_ANCHORS).ok_or(ScrapeError::Extraction {
        kind: ExtractionKind::InitialState,
    })
}

/// Try every anchor variant; for each occurrence scan the balanced object
/// that follows and return the first one that parses as JSON.
fn extract_after_anchors(html: &str, anchors: &[&str]) -> Option<Value> {
    for anchor in anchors {
        let mut search_from = 0;
        while let Some(found) = html[search_from..].find(anchor) {
            let after = search_from + found + anchor.len();
            if let Some(object) = balanced_object(&html[after..]) {
                if let Ok(value) = serde_json::from_str::<Value>(object) {
                    return Some(value);
                }
            }
            search_from = after;
        }
    }
    None
}

/// The balanced `{…}` starting at the first `{` of `text`.
///
/// Braces inside string literals do not count, and escaped quotes do not end
/// a string. Returns `None` when no opening brace exists before other
/// non-whitespace or the braces never balance.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find(|c: char| !c.is_whitespace())?;
    if text[start..].chars().next() != Some('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = concat!(
        "<html><script>stuff; ytcfg.set({\"INNERTUBE_API_KEY\": \"key123\", ",
        "\"INNERTUBE_CONTEXT\": {\"client\": {\"clientName\": \"WEB\", ",
        "\"clientVersion\": \"2.2024\", \"visitorData\": \"vis\"}}});</script>",
        "<script>var ytInitialData = {\"contents\": {\"note\": \"a } in a string\"}};</script>",
        "</html>"
    );

    #[test]
    fn extracts_config_fields() {
        let config = extract_config(PAGE).unwrap();
        assert_eq!(config.api_key(), Some("key123"));
        assert_eq!(config.client_version(), Some("2.2024"));
        assert_eq!(config.visitor_data(), Some("vis"));
    }

    #[test]
    fn extracts_initial_state_despite_brace_in_string() {
        let state = extract_initial_state(PAGE).unwrap();
        assert_eq!(
            state.pointer("/contents/note").and_then(Value::as_str),
            Some("a } in a string")
        );
    }

    #[test]
    fn tries_every_anchor_variant() {
        let html = r#"<script>window["ytInitialData"] = {"a": 1};</script>"#;
        let state = extract_initial_state(html).unwrap();
        assert_eq!(state["a"], 1);
    }

    #[test]
    fn missing_anchor_fails_with_kind() {
        let err = extract_initial_state("<html>nothing here</html>").unwrap_err();
        match err {
            ScrapeError::Extraction { kind } => {
                assert_eq!(kind, crate::errors::ExtractionKind::InitialState)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unbalanced_braces_fail() {
        let html = "var ytInitialData = {\"a\": {\"b\": 1}";
        assert!(extract_initial_state(html).is_err());
    }

    #[test]
    fn escaped_quotes_do_not_end_strings() {
        let html = r#"var ytInitialData = {"a": "he said \"hi\" {"};"#;
        let state = extract_initial_state(html).unwrap();
        assert_eq!(state["a"], "he said \"hi\" {");
    }

    #[test]
    fn language_override_lands_in_context() {
        let mut config = extract_config(PAGE).unwrap();
        config.set_language("de");
        assert_eq!(
            config.context().pointer("/client/hl").and_then(Value::as_str),
            Some("de")
        );
    }
}
