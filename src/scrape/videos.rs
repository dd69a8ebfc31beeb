//! Channel video-listing pagination.
//!
//! One HTML fetch seeds the first page and the client configuration; every
//! page after that comes from the RPC endpoint keyed by the previous page's
//! continuation token. Records are emitted through a bounded channel as
//! each page is parsed, so a caller that stops early never pays for pages
//! it does not consume.

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::extract::{extract_config, extract_initial_state};
use super::fetch::fetch_html;
use super::normalize::normalize_video;
use super::rpc::{Browse, RpcClient};
use super::search::{find_continuations, first_key, search_key, select_continuation};
use super::session::open_session;
use super::STREAM_BUFFER;
use crate::errors::ScrapeError;
use crate::models::{StreamOutcome, VideoRecord};
use crate::utils::channels::channel_videos_url;

/// RPC endpoint that serves listing pages.
const LISTING_ENDPOINT: &str = "browse";

/// A lazy, forward-only stream of [`VideoRecord`]s.
///
/// Not restartable: a new call to [`ChannelVideosScraper::stream`] starts a
/// fresh scrape from page one. Dropping the stream abandons it; the
/// producer stops at its next send.
pub struct VideoStream {
    receiver: mpsc::Receiver<VideoRecord>,
    handle: JoinHandle<StreamOutcome>,
}

impl VideoStream {
    /// Next record, or `None` when the stream has ended. After `None`, call
    /// [`finish`](Self::finish) for the terminal state.
    pub async fn recv(&mut self) -> Option<VideoRecord> {
        self.receiver.recv().await
    }

    /// Consume the stream and report why it ended.
    pub async fn finish(self) -> StreamOutcome {
        drop(self.receiver);
        self.handle.await.unwrap_or_else(|e| {
            StreamOutcome::Failed(ScrapeError::Server(format!("pagination task died: {e}")))
        })
    }

    /// Drain every remaining record, then report the terminal state.
    pub async fn collect(mut self) -> (Vec<VideoRecord>, StreamOutcome) {
        let mut records = Vec::new();
        while let Some(record) = self.recv().await {
            records.push(record);
        }
        let outcome = self.finish().await;
        (records, outcome)
    }
}

/// Scraper for a channel's video listing.
pub struct ChannelVideosScraper {
    language: String,
    debug: bool,
}

impl ChannelVideosScraper {
    pub fn new(language: &str, debug: bool) -> Self {
        Self {
            language: language.to_string(),
            debug,
        }
    }

    /// Open the listing for `channel_ref` (an `@handle` or `UC…` id) and
    /// stream its videos, newest first. `limit` truncates the stream at
    /// exactly that many records.
    pub async fn stream(
        &self,
        channel_ref: &str,
        limit: Option<u64>,
    ) -> Result<VideoStream, ScrapeError> {
        let url = channel_videos_url(channel_ref);
        let session = open_session(&self.language)?;

        let html = fetch_html(&session, &url, self.debug).await?;
        let mut config = extract_config(&html)?;
        config.set_language(&self.language);
        let state = extract_initial_state(&html)?;

        let channel_id = resolve_channel_id(&state, channel_ref);
        let rpc = RpcClient::new(&session, config)?;
        info!("listing channel {channel_id} via {url}");

        let (tx, receiver) = mpsc::channel(STREAM_BUFFER);
        let handle =
            tokio::spawn(
                async move { drive_listing(rpc, state, channel_id, limit, tx).await },
            );

        Ok(VideoStream { receiver, handle })
    }
}

/// The pagination state machine: emit the current page, locate the next
/// token, fetch, repeat. Generic over [`Browse`] so terminal-state and
/// ordering behavior is tested against canned pages.
async fn drive_listing<B: Browse>(
    rpc: B,
    first_page: Value,
    channel_id: String,
    limit: Option<u64>,
    tx: mpsc::Sender<VideoRecord>,
) -> StreamOutcome {
    let mut emitted: u64 = 0;
    let mut page = first_page;

    loop {
        for raw in collect_listing_items(&page) {
            if limit.is_some_and(|lim| emitted >= lim) {
                return StreamOutcome::LimitReached;
            }
            emitted += 1;
            let record = normalize_video(raw, emitted, &channel_id);
            if tx.send(record).await.is_err() {
                // Receiver dropped: the caller abandoned the stream.
                return StreamOutcome::Exhausted;
            }
        }

        if limit.is_some_and(|lim| emitted >= lim) {
            return StreamOutcome::LimitReached;
        }

        let candidates = find_continuations(&page);
        let Some(next) = select_continuation(&candidates) else {
            return StreamOutcome::Exhausted;
        };

        page = match rpc.continuation(LISTING_ENDPOINT, &next.token).await {
            Ok(response) => response,
            Err(err) => return StreamOutcome::Failed(err),
        };
    }
}

/// Raw video entries of a page, in the order the host returned them.
///
/// The listing grid has shipped under several renderer names; entries
/// without a video id (promo slots) are skipped so `order` stays contiguous
/// over real videos.
fn collect_listing_items(page: &Value) -> Vec<&Value> {
    let rich: Vec<&Value> = search_key(page, "richItemRenderer")
        .into_iter()
        .filter_map(|item| {
            first_key(item, "videoRenderer").or_else(|| first_key(item, "reelItemRenderer"))
        })
        .collect();

    let found = if !rich.is_empty() {
        rich
    } else {
        let grid = search_key(page, "gridVideoRenderer");
        if !grid.is_empty() {
            grid
        } else {
            search_key(page, "videoRenderer")
        }
    };

    found
        .into_iter()
        .filter(|raw| raw.get("videoId").and_then(Value::as_str).is_some())
        .collect()
}

fn resolve_channel_id(state: &Value, channel_ref: &str) -> String {
    if let Some(id) = first_key(state, "externalId").and_then(Value::as_str) {
        return id.to_string();
    }
    if channel_ref.starts_with("UC") {
        return channel_ref.to_string();
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct FakeBrowse {
        pages: Mutex<VecDeque<Result<Value, ScrapeError>>>,
    }

    impl FakeBrowse {
        fn new(pages: Vec<Result<Value, ScrapeError>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
            }
        }
    }

    #[async_trait::async_trait]
    impl Browse for FakeBrowse {
        async fn continuation(&self, _endpoint: &str, _token: &str) -> Result<Value, ScrapeError> {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ScrapeError::Server("fake ran dry".into())))
        }
    }

    fn page(ids: &[&str], token: Option<&str>) -> Value {
        let items: Vec<Value> = ids
            .iter()
            .map(|id| {
                json!({"richItemRenderer": {"content": {"videoRenderer": {
                    "videoId": id,
                    "title": {"simpleText": format!("video {id}")},
                }}}})
            })
            .collect();
        let mut contents = json!({"items": items});
        if let Some(token) = token {
            contents["next"] = json!({"continuationItemRenderer": {
                "continuationEndpoint": {"continuationCommand": {"token": token}}
            }});
        }
        contents
    }

    async fn run(
        first: Value,
        pages: Vec<Result<Value, ScrapeError>>,
        limit: Option<u64>,
    ) -> (Vec<VideoRecord>, StreamOutcome) {
        let (tx, mut rx) = mpsc::channel(STREAM_BUFFER);
        let outcome = drive_listing(FakeBrowse::new(pages), first, "UCtest".into(), limit, tx).await;
        let mut records = Vec::new();
        while let Ok(record) = rx.try_recv() {
            records.push(record);
        }
        (records, outcome)
    }

    #[tokio::test]
    async fn order_is_contiguous_across_pages() {
        let first = page(&["a", "b"], Some("tok-1"));
        let rest = vec![
            Ok(page(&["c", "d"], Some("tok-2"))),
            Ok(page(&["e"], None)),
        ];
        let (records, outcome) = run(first, rest, None).await;

        let orders: Vec<u64> = records.iter().map(|r| r.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
        let ids: Vec<&str> = records.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d", "e"]);
        assert!(matches!(outcome, StreamOutcome::Exhausted));
    }

    #[tokio::test]
    async fn limit_truncates_exactly_and_yields_a_prefix() {
        let full = run(
            page(&["a", "b", "c"], Some("t")),
            vec![Ok(page(&["d", "e", "f"], None))],
            None,
        )
        .await
        .0;

        let (limited, outcome) = run(
            page(&["a", "b", "c"], Some("t")),
            vec![Ok(page(&["d", "e", "f"], None))],
            Some(4),
        )
        .await;

        assert_eq!(limited.len(), 4);
        assert_eq!(limited[..], full[..4]);
        assert!(matches!(outcome, StreamOutcome::LimitReached));
    }

    #[tokio::test]
    async fn limit_beyond_total_exhausts_normally() {
        let (records, outcome) = run(page(&["a", "b"], None), vec![], Some(10)).await;
        assert_eq!(records.len(), 2);
        assert!(matches!(outcome, StreamOutcome::Exhausted));
    }

    #[tokio::test]
    async fn rpc_failure_keeps_prior_pages_and_reports_error() {
        let first = page(&["a", "b"], Some("tok-1"));
        let rest = vec![
            Ok(page(&["c", "d"], Some("tok-2"))),
            Err(ScrapeError::Rpc {
                endpoint: "browse".into(),
                status: 500,
            }),
        ];
        let (records, outcome) = run(first, rest, None).await;

        assert_eq!(records.len(), 4);
        match outcome {
            StreamOutcome::Failed(ScrapeError::Rpc { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn limit_at_page_boundary_skips_the_next_fetch() {
        // No pages are queued: reaching the limit exactly at the end of the
        // first page must not fetch again.
        let (records, outcome) = run(page(&["a", "b"], Some("tok")), vec![], Some(2)).await;
        assert_eq!(records.len(), 2);
        assert!(matches!(outcome, StreamOutcome::LimitReached));
    }

    #[test]
    fn promo_slots_without_video_id_are_skipped() {
        let page = json!({"contents": [
            {"richItemRenderer": {"content": {"videoRenderer": {"videoId": "real"}}}},
            {"richItemRenderer": {"content": {"adSlotRenderer": {"something": 1}}}},
        ]});
        let items = collect_listing_items(&page);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn grid_renderer_fallback_is_used_when_rich_items_absent() {
        let page = json!({"grid": {"items": [
            {"gridVideoRenderer": {"videoId": "g1"}},
            {"gridVideoRenderer": {"videoId": "g2"}},
        ]}});
        let items = collect_listing_items(&page);
        assert_eq!(items.len(), 2);
    }
}
