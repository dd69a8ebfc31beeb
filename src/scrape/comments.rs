//! Comment-thread pagination.
//!
//! A thread pages on two levels: top-level comments through one
//! continuation chain, and each comment's replies through their own. The
//! top-level chain is drained completely first; reply continuations are
//! collected along the way and fetched one at a time afterwards, so an
//! early limit never pays for reply pages nobody will see.
//!
//! A video with comments turned off has no comment section in its initial
//! state at all. That is a first-class terminal state here, not an error,
//! and is distinguishable from a thread that exists but is empty.

use std::collections::{HashMap, VecDeque};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::extract::{extract_config, extract_initial_state};
use super::fetch::fetch_html;
use super::normalize::{display_text, normalize_comment, parse_comment_count};
use super::rpc::{Browse, RpcClient};
use super::search::{find_continuations, first_key, search_key, select_continuation};
use super::session::open_session;
use super::{watch_url, STREAM_BUFFER};
use crate::errors::ScrapeError;
use crate::models::{CommentRecord, StreamOutcome};

/// RPC endpoint that serves thread pages.
const THREAD_ENDPOINT: &str = "next";

/// Container target ids the host routes top-level thread updates to.
const COMMENT_SECTION_TARGETS: &[&str] = &[
    "comments-section",
    "engagement-panel-comments-section",
    "shorts-engagement-panel-comments-section",
];

/// Target-id prefix for per-comment reply containers.
const REPLIES_TARGET_PREFIX: &str = "comment-replies-item";

/// Thread sort mode. Fixed before the first RPC call; the host encodes it
/// in the initial continuation, so it cannot change mid-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    /// Newest first.
    #[default]
    Recent,
    /// The host's "top comments" ranking.
    Popular,
}

impl SortOrder {
    /// Position in the host's sort submenu.
    fn menu_index(self) -> usize {
        match self {
            SortOrder::Popular => 0,
            SortOrder::Recent => 1,
        }
    }
}

/// A lazy stream of [`CommentRecord`]s for one video.
pub struct CommentStream {
    receiver: mpsc::Receiver<CommentRecord>,
    total_count: Option<u64>,
    disabled: bool,
    handle: JoinHandle<StreamOutcome>,
}

impl CommentStream {
    /// Total comment count the host advertised, when it did.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// True when the video has no comment section at all.
    pub fn disabled(&self) -> bool {
        self.disabled
    }

    /// Next record, or `None` when the stream has ended.
    pub async fn recv(&mut self) -> Option<CommentRecord> {
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
    pub async fn collect(mut self) -> (Vec<CommentRecord>, StreamOutcome) {
        let mut records = Vec::new();
        while let Some(record) = self.recv().await {
            records.push(record);
        }
        let outcome = self.finish().await;
        (records, outcome)
    }

    fn disabled_stream() -> Self {
        let (_tx, receiver) = mpsc::channel(1);
        Self {
            receiver,
            total_count: None,
            disabled: true,
            handle: tokio::spawn(async { StreamOutcome::Disabled }),
        }
    }
}

/// Scraper for one video's comment thread.
pub struct CommentThreadScraper {
    language: String,
    sort: SortOrder,
    debug: bool,
}

impl CommentThreadScraper {
    pub fn new(language: &str, sort: SortOrder, debug: bool) -> Self {
        Self {
            language: language.to_string(),
            sort,
            debug,
        }
    }

    /// Open the thread for `video_id` and stream its comments: every
    /// top-level comment first, then the reply threads.
    pub async fn stream(
        &self,
        video_id: &str,
        limit: Option<u64>,
    ) -> Result<CommentStream, ScrapeError> {
        let url = watch_url(video_id);
        let session = open_session(&self.language)?;

        let html = fetch_html(&session, &url, self.debug).await?;
        let mut config = extract_config(&html)?;
        config.set_language(&self.language);
        let mut data = extract_initial_state(&html)?;

        if !comments_enabled(&data) {
            info!("video {video_id} has comments disabled");
            return Ok(CommentStream::disabled_stream());
        }

        let rpc = RpcClient::new(&session, config)?;

        // Surfaces without an inline sort menu (community posts and some
        // panel variants) need one extra round-trip before it appears.
        if sort_menu(&data).is_none() {
            if let Some(token) = section_list_continuation(&data) {
                debug!("no inline sort menu, following section-list continuation");
                data = rpc.continuation(THREAD_ENDPOINT, &token).await?;
            }
        }

        let first_token = sort_continuation(&data, self.sort)?;
        let mut total_count = extract_comment_count(&data);

        // First thread page, fetched before the stream exists so a failure
        // here surfaces before any records do.
        let seed = rpc.continuation(THREAD_ENDPOINT, &first_token).await?;
        if total_count.is_none() {
            total_count = extract_comment_count(&seed);
        }

        let (tx, receiver) = mpsc::channel(STREAM_BUFFER);
        let handle = tokio::spawn(async move { drive_thread(rpc, seed, limit, tx).await });

        Ok(CommentStream {
            receiver,
            total_count,
            disabled: false,
            handle,
        })
    }
}

/// Whether the initial state carries a comment section at all.
fn comments_enabled(state: &Value) -> bool {
    first_key(state, "itemSectionRenderer")
        .map(|section| first_key(section, "continuationItemRenderer").is_some())
        .unwrap_or(false)
}

fn sort_menu(data: &Value) -> Option<&Vec<Value>> {
    first_key(data, "sortFilterSubMenuRenderer")
        .and_then(|menu| menu.get("subMenuItems"))
        .and_then(Value::as_array)
}

/// Continuation for the requested sort mode, from the sort submenu.
fn sort_continuation(data: &Value, sort: SortOrder) -> Result<String, ScrapeError> {
    let menu = sort_menu(data)
        .ok_or_else(|| ScrapeError::Server("comment sort menu not found".to_string()))?;
    let item = menu
        .get(sort.menu_index())
        .ok_or_else(|| ScrapeError::Server("failed to set comment sorting".to_string()))?;
    let endpoint = item
        .get("serviceEndpoint")
        .unwrap_or(item);
    let candidates = find_continuations(endpoint);
    select_continuation(&candidates)
        .map(|c| c.token.clone())
        .ok_or_else(|| ScrapeError::Server("sort menu entry had no continuation".to_string()))
}

/// First continuation under the section list, for surfaces that need the
/// extra round-trip before the sort menu exists.
fn section_list_continuation(data: &Value) -> Option<String> {
    let section_list = first_key(data, "sectionListRenderer")?;
    find_continuations(section_list)
        .into_iter()
        .next()
        .map(|c| c.token)
}

/// Everything one thread page contributes to the drive loop.
#[derive(Debug, Default)]
struct ThreadPage {
    comments: Vec<CommentRecord>,
    /// Continuations of the top-level chain.
    more_toplevel: Vec<String>,
    /// Per-comment reply continuations, in discovery order.
    more_replies: Vec<String>,
}

/// The two-cursor drive: drain the top-level chain first, then the reply
/// queue. Generic over [`Browse`] for fixture tests.
async fn drive_thread<B: Browse>(
    rpc: B,
    seed: Value,
    limit: Option<u64>,
    tx: mpsc::Sender<CommentRecord>,
) -> StreamOutcome {
    let mut toplevel: VecDeque<String> = VecDeque::new();
    let mut replies: VecDeque<String> = VecDeque::new();
    let mut emitted: u64 = 0;
    let mut page = seed;

    loop {
        let parsed = match parse_thread_page(&page) {
            Ok(parsed) => parsed,
            Err(err) => return StreamOutcome::Failed(err),
        };
        toplevel.extend(parsed.more_toplevel);
        replies.extend(parsed.more_replies);

        for record in parsed.comments {
            if limit.is_some_and(|lim| emitted >= lim) {
                return StreamOutcome::LimitReached;
            }
            emitted += 1;
            if tx.send(record).await.is_err() {
                // Receiver dropped: the caller abandoned the stream.
                return StreamOutcome::Exhausted;
            }
        }

        if limit.is_some_and(|lim| emitted >= lim) {
            return StreamOutcome::LimitReached;
        }

        // Top-level chain first; replies only once it is dry.
        let Some(token) = toplevel.pop_front().or_else(|| replies.pop_front()) else {
            return StreamOutcome::Exhausted;
        };

        page = match rpc.continuation(THREAD_ENDPOINT, &token).await {
            Ok(response) => response,
            Err(err) => return StreamOutcome::Failed(err),
        };
    }
}

/// Parse one RPC thread page: comments plus the continuations it exposes,
/// routed by the container each update targets.
fn parse_thread_page(page: &Value) -> Result<ThreadPage, ScrapeError> {
    if let Some(message) = first_key(page, "externalErrorMessage").and_then(Value::as_str) {
        return Err(ScrapeError::Server(message.to_string()));
    }

    let mut parsed = ThreadPage::default();

    let mut actions = search_key(page, "reloadContinuationItemsCommand");
    actions.extend(search_key(page, "appendContinuationItemsAction"));

    for action in actions {
        let target_id = action
            .get("targetId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(items) = action.get("continuationItems").and_then(Value::as_array) else {
            continue;
        };

        if COMMENT_SECTION_TARGETS.contains(&target_id) {
            for item in items {
                if item.get("commentThreadRenderer").is_some() {
                    // Reply continuation riding inline on a top-level comment.
                    parsed
                        .more_replies
                        .extend(find_continuations(item).into_iter().map(|c| c.token));
                } else if item.get("continuationItemRenderer").is_some() {
                    let candidates = find_continuations(item);
                    if let Some(next) = select_continuation(&candidates) {
                        parsed.more_toplevel.push(next.token.clone());
                    }
                }
            }
        } else if target_id.starts_with(REPLIES_TARGET_PREFIX) {
            for item in items {
                let Some(renderer) = item.get("continuationItemRenderer") else {
                    continue;
                };
                // The "show more replies" button hides its continuation in a
                // buttonRenderer command.
                let source = first_key(renderer, "buttonRenderer").unwrap_or(renderer);
                let candidates = find_continuations(source);
                if let Some(next) = select_continuation(&candidates) {
                    parsed.more_replies.push(next.token.clone());
                }
            }
        }
    }

    let toolbar_states: HashMap<&str, &Value> =
        search_key(page, "engagementToolbarStateEntityPayload")
            .into_iter()
            .filter_map(|payload| {
                payload
                    .get("key")
                    .and_then(Value::as_str)
                    .map(|key| (key, payload))
            })
            .collect();

    for payload in search_key(page, "commentEntityPayload") {
        let state = payload
            .pointer("/properties/toolbarStateKey")
            .and_then(Value::as_str)
            .and_then(|key| toolbar_states.get(key).copied());
        parsed.comments.push(normalize_comment(payload, state));
    }

    Ok(parsed)
}

/// Total comment count from a header renderer, wherever it is this month.
fn extract_comment_count(data: &Value) -> Option<u64> {
    for key in ["commentCountRenderer", "commentsHeaderRenderer", "headerRenderer"] {
        for renderer in search_key(data, key) {
            for field in ["countText", "title"] {
                if let Some(count) = renderer
                    .get(field)
                    .map(|node| display_text(Some(node)))
                    .and_then(|text| parse_comment_count(&text))
                {
                    return Some(count);
                }
            }
        }
    }
    match first_key(data, "commentCount") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => parse_comment_count(s),
        Some(node) => parse_comment_count(&display_text(Some(node))),
        None => None,
    }
}
