//! The extraction-and-pagination engine.
//!
//! The host site serves its application state as JSON embedded in
//! server-rendered HTML and pages further results through an internal RPC
//! endpoint keyed by opaque continuation tokens. The engine bootstraps a
//! browsing session, recovers the embedded state, locates continuation
//! tokens, and drives the RPC endpoint until a listing or comment thread is
//! exhausted.
//!
//! Everything here is stateless between top-level calls: each scrape opens
//! its own session and nothing is cached or persisted.

pub mod comments;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod rpc;
pub mod search;
pub mod session;
pub mod videos;

pub use comments::{CommentStream, CommentThreadScraper, SortOrder};
pub use extract::ClientConfig;
pub use session::{open_session, Session};
pub use videos::{ChannelVideosScraper, VideoStream};

use std::time::Duration;

/// Fixed per-request timeout for HTML and RPC calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed pause between consecutive RPC calls.
pub const REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Channel capacity for pagination streams. Bounds how far a producer can
/// run ahead of a slow consumer.
pub(crate) const STREAM_BUFFER: usize = 100;

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}
