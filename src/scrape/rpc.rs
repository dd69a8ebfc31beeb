//! Client for the host's internal RPC endpoint.
//!
//! The host's own web client fetches follow-up pages by POSTing a JSON body
//! to `youtubei/v1/<endpoint>` with the page's API key as a query parameter
//! and a `context` block replaying the client configuration. This client
//! does the same and nothing more: no retry, no backoff. The pagination
//! loop decides whether an error is terminal.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::extract::ClientConfig;
use super::session::Session;
use super::REQUEST_DELAY;
use crate::errors::ScrapeError;

const RPC_BASE: &str = "https://www.youtube.com/youtubei/v1";

/// The one seam the pagination loops drive pages through. Lets the drive
/// loops run against canned fixtures in tests.
#[async_trait]
pub trait Browse: Send + Sync {
    /// Request the page behind `token` from `endpoint`.
    async fn continuation(&self, endpoint: &str, token: &str) -> Result<Value, ScrapeError>;
}

/// RPC client bound to one session and one extracted client configuration.
pub struct RpcClient {
    http: reqwest::Client,
    config: ClientConfig,
    api_key: String,
}

impl RpcClient {
    /// Bind a client. Fails when the extracted configuration is missing the
    /// API key, since no RPC call can succeed without it.
    pub fn new(session: &Session, config: ClientConfig) -> Result<Self, ScrapeError> {
        let api_key = config
            .api_key()
            .ok_or(ScrapeError::Extraction {
                kind: crate::errors::ExtractionKind::Config,
            })?
            .to_string();
        Ok(Self {
            http: session.client().clone(),
            config,
            api_key,
        })
    }

    /// POST `body` (plus the replayed context) to `endpoint` and parse the
    /// response as JSON. Sleeps the fixed inter-request delay afterwards so
    /// consecutive pagination calls respect host rate expectations.
    pub async fn call(&self, endpoint: &str, body: Value) -> Result<Value, ScrapeError> {
        let url = format!(
            "{RPC_BASE}/{endpoint}?key={}&prettyPrint=false",
            urlencoding::encode(&self.api_key)
        );

        let mut payload = body;
        if let Some(map) = payload.as_object_mut() {
            map.insert("context".to_string(), self.config.context());
        }

        let mut request = self.http.post(&url).json(&payload);
        if let Some(version) = self.config.client_version() {
            request = request.header("X-Youtube-Client-Version", version);
        }
        if let Some(visitor) = self.config.visitor_data() {
            request = request.header("X-Goog-Visitor-Id", visitor);
        }

        let response = request.send().await.map_err(|e| ScrapeError::Fetch {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Rpc {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| ScrapeError::Fetch {
            url,
            reason: e.to_string(),
        })?;
        let parsed =
            serde_json::from_str::<Value>(&text).map_err(|_| ScrapeError::MalformedResponse {
                endpoint: endpoint.to_string(),
            })?;

        debug!("rpc {endpoint} returned {} bytes", text.len());
        tokio::time::sleep(REQUEST_DELAY).await;
        Ok(parsed)
    }
}

#[async_trait]
impl Browse for RpcClient {
    async fn continuation(&self, endpoint: &str, token: &str) -> Result<Value, ScrapeError> {
        self.call(endpoint, json!({ "continuation": token })).await
    }
}
