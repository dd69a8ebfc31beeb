//! Browsing-session bootstrap and consent-gate bypass.
//!
//! The host serves a regional consent interstitial instead of content until
//! a consent cookie is present. Everything host-specific about cookies and
//! headers lives here, behind [`open_session`]; the rest of the engine only
//! sees a ready-to-use client.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use url::Url;

use super::REQUEST_TIMEOUT;
use crate::errors::ScrapeError;

/// Real browser user agents. A scrape picks one per session.
const BROWSER_USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    // Chrome on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    // Firefox on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
    // Safari on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

/// Marker the consent interstitial carries in its form markup.
const CONSENT_FORM_MARKER: &str = "action=\"https://consent.youtube.com/";

/// Cookie domain the consent cookies are scoped to.
const COOKIE_ORIGIN: &str = "https://www.youtube.com";

/// An open browsing session: HTTP client plus its cookie jar.
///
/// Owned exclusively by the operation that opened it; concurrent top-level
/// scrapes each open their own.
#[derive(Clone)]
pub struct Session {
    client: reqwest::Client,
    jar: Arc<Jar>,
}

/// Build a session with browser-like headers for the given UI language.
pub fn open_session(language: &str) -> Result<Session, ScrapeError> {
    let jar = Arc::new(Jar::default());

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&accept_language(language))
            .map_err(|e| ScrapeError::Session(format!("invalid language value: {e}")))?,
    );

    let client = reqwest::Client::builder()
        .user_agent(pick_user_agent())
        .default_headers(headers)
        .cookie_provider(jar.clone())
        .timeout(REQUEST_TIMEOUT)
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| ScrapeError::Session(format!("failed to build HTTP client: {e}")))?;

    Ok(Session { client, jar })
}

impl Session {
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Install the consent-acceptance cookies ahead of a retry.
    ///
    /// The gate has used more than one cookie name over time; setting both
    /// is harmless and saves a second round-trip of detection.
    pub(crate) fn install_consent_cookies(&self) {
        let origin: Url = COOKIE_ORIGIN.parse().expect("static origin URL");
        self.jar.add_cookie_str(
            "CONSENT=YES+cb.20210328-17-p0.en+FX+678; Domain=.youtube.com; Path=/",
            &origin,
        );
        self.jar
            .add_cookie_str("SOCS=CAI; Domain=.youtube.com; Path=/", &origin);
    }
}

/// Whether a response landed on (or still carries) the consent gate.
pub(crate) fn is_consent_gate(final_url: &Url, body: &str) -> bool {
    let consent_host = final_url
        .host_str()
        .map(|h| h.starts_with("consent."))
        .unwrap_or(false);
    consent_host || body.contains(CONSENT_FORM_MARKER)
}

fn accept_language(language: &str) -> String {
    if language.is_empty() || language == "en" {
        "en-US,en;q=0.9".to_string()
    } else {
        format!("{language},{language};q=0.9,en;q=0.5")
    }
}

fn pick_user_agent() -> &'static str {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_nanos() as usize)
        .unwrap_or(0);
    BROWSER_USER_AGENTS[nanos % BROWSER_USER_AGENTS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agents_look_like_browsers() {
        assert!(pick_user_agent().contains("Mozilla"));
    }

    #[test]
    fn accept_language_defaults_to_english() {
        assert_eq!(accept_language("en"), "en-US,en;q=0.9");
        assert!(accept_language("de").starts_with("de,de;q=0.9"));
    }

    #[test]
    fn consent_gate_detected_by_host() {
        let url: Url = "https://consent.youtube.com/m?continue=x".parse().unwrap();
        assert!(is_consent_gate(&url, ""));
    }

    #[test]
    fn consent_gate_detected_by_form_marker() {
        let url: Url = "https://www.youtube.com/watch?v=abc".parse().unwrap();
        let body = r#"<form action="https://consent.youtube.com/s" method="POST">"#;
        assert!(is_consent_gate(&url, body));
        assert!(!is_consent_gate(&url, "<html>regular page</html>"));
    }
}
