//! Single-page HTML fetching.

use tracing::{debug, warn};
use url::Url;

use super::session::{is_consent_gate, Session};
use crate::errors::ScrapeError;

/// Where the raw body of the last fetch is mirrored when debug capture is on.
pub const DEBUG_HTML_PATH: &str = "ytgrab-last-fetch.html";

/// Fetch one HTML page through the session.
///
/// Performs exactly one GET (plus at most one consent retry, handled
/// transparently). No other retry happens here; retry policy belongs to the
/// caller. With `debug` set the raw body is mirrored to [`DEBUG_HTML_PATH`]
/// before returning, best-effort.
pub async fn fetch_html(session: &Session, url: &str, debug: bool) -> Result<String, ScrapeError> {
    let (final_url, body) = get_text(session, url).await?;

    let body = if is_consent_gate(&final_url, &body) {
        debug!("consent gate detected for {url}, retrying with consent cookies");
        session.install_consent_cookies();
        let (final_url, retried) = get_text(session, url).await?;
        if is_consent_gate(&final_url, &retried) {
            return Err(ScrapeError::Session(
                "consent gate persisted after setting consent cookies".to_string(),
            ));
        }
        retried
    } else {
        body
    };

    if debug {
        if let Err(e) = std::fs::write(DEBUG_HTML_PATH, &body) {
            warn!("failed to mirror response body to {DEBUG_HTML_PATH}: {e}");
        }
    }

    Ok(body)
}

/// One GET. Returns the post-redirect URL together with the body; redirects
/// onto the consent host are one of the gate signals.
async fn get_text(session: &Session, url: &str) -> Result<(Url, String), ScrapeError> {
    let response = session
        .client()
        .get(url)
        .send()
        .await
        .map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Fetch {
            url: url.to_string(),
            reason: format!("status {status}"),
        });
    }

    let final_url = response.url().clone();
    let body = response.text().await.map_err(|e| ScrapeError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    Ok((final_url, body))
}
