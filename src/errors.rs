//! Error taxonomy for the extraction engine.
//!
//! Page-level failures terminate a pagination stream early but never discard
//! records that were already delivered; `Session` failures happen before any
//! records exist. Every variant carries the URL or endpoint it came from so
//! the caller can log it and decide whether to rerun the whole operation.

use thiserror::Error;

/// Which embedded document failed to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionKind {
    /// The page's client configuration object.
    Config,
    /// The page's initial-state object.
    InitialState,
}

impl std::fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionKind::Config => write!(f, "config"),
            ExtractionKind::InitialState => write!(f, "initial_state"),
        }
    }
}

/// Errors raised by the scraping engine.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Session bootstrap failed (consent gate could not be bypassed).
    #[error("session bootstrap failed: {0}")]
    Session(String),

    /// Transport or status failure fetching a page.
    #[error("request for {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    /// An embedded JSON document could not be located or parsed.
    /// Usually means the host's markup drifted.
    #[error("could not extract embedded {kind} from page")]
    Extraction { kind: ExtractionKind },

    /// Non-success HTTP status from the internal RPC endpoint.
    #[error("rpc endpoint {endpoint} returned status {status}")]
    Rpc { endpoint: String, status: u16 },

    /// RPC response body was not valid JSON.
    #[error("rpc endpoint {endpoint} returned an unparseable body")]
    MalformedResponse { endpoint: String },

    /// The host returned a well-formed response carrying an error message.
    #[error("server reported an error: {0}")]
    Server(String),
}

impl ScrapeError {
    /// Exit code for the CLI boundary. Every engine error is host or
    /// network trouble; internal bugs exit through a panic or an anyhow
    /// context at the command layer instead.
    pub fn exit_code(&self) -> i32 {
        exit_codes::NETWORK
    }
}

/// Process exit codes shared by all subcommands.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER: i32 = 1;
    pub const NETWORK: i32 = 2;
    pub const INTERNAL: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_kind_tags_render_stable() {
        assert_eq!(ExtractionKind::Config.to_string(), "config");
        assert_eq!(ExtractionKind::InitialState.to_string(), "initial_state");
    }

    #[test]
    fn errors_carry_their_context() {
        let err = ScrapeError::Rpc {
            endpoint: "next".to_string(),
            status: 403,
        };
        let msg = err.to_string();
        assert!(msg.contains("next"));
        assert!(msg.contains("403"));

        let err = ScrapeError::Fetch {
            url: "https://example.com/x".to_string(),
            reason: "timed out".to_string(),
        };
        assert!(err.to_string().contains("https://example.com/x"));
    }

    #[test]
    fn page_level_errors_map_to_network_exit_code() {
        let err = ScrapeError::Server("busted".to_string());
        assert_eq!(err.exit_code(), exit_codes::NETWORK);
    }
}
