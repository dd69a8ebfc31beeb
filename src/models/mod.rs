//! Record types emitted by the extraction engine and the batch pipeline.
//!
//! The field sets of [`VideoRecord`] and [`CommentRecord`] are a published
//! compatibility contract: every field is always present with a stable type.
//! Fields may be added in future revisions, never removed or retyped.

use serde::{Deserialize, Serialize};

use crate::errors::ScrapeError;

/// One video from a channel listing, in the order the host returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Host-assigned video id.
    pub video_id: String,
    /// Display title (empty string when the host omitted it).
    pub title: String,
    /// 1-based position in emission order; 1 is the newest upload.
    pub order: u64,
    /// Parsed view count, absent when the raw text was unparsable.
    pub view_count: Option<u64>,
    /// Original view-count text, preserved verbatim.
    pub view_count_raw: String,
    /// Display duration string, e.g. `10:25`.
    pub length: String,
    /// Duration in minutes, absent when the display string was malformed.
    pub length_minutes: Option<f64>,
    /// Best-resolution thumbnail URL known for the video.
    pub thumbnail_url: String,
    /// Canonical watch URL.
    pub url: String,
    /// Id of the channel the listing was scraped from.
    pub channel_id: String,
}

/// One comment from a video's thread.
///
/// Top-level comments are always emitted before their own replies; there is
/// no other ordering guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Host comment id. Reply ids contain a `.` separating parent and child.
    pub cid: String,
    /// Comment text content.
    pub text: String,
    /// Relative publication time as displayed, e.g. `2 years ago`.
    pub time: String,
    /// Author display name.
    pub author: String,
    /// Author channel id.
    pub channel: String,
    /// Like count as displayed (`"0"` when the host shows none).
    pub votes: String,
    /// Reply count as displayed.
    pub replies: String,
    /// Author avatar URL.
    pub photo: String,
    /// Whether the uploader hearted the comment.
    pub heart: bool,
    /// True for entries that belong to a reply thread.
    pub reply: bool,
}

/// Why a pagination stream stopped producing records.
#[derive(Debug)]
pub enum StreamOutcome {
    /// The host ran out of pages.
    Exhausted,
    /// The caller-supplied item limit was reached; the stream was truncated
    /// exactly at the limit.
    LimitReached,
    /// The video has no comment section at all. Distinct from a thread that
    /// exists but has zero comments (that is `Exhausted`).
    Disabled,
    /// A page-level failure ended the stream early. Records delivered before
    /// the failure remain valid partial results.
    Failed(ScrapeError),
}

impl StreamOutcome {
    /// True when the stream ended without an error.
    pub fn is_clean(&self) -> bool {
        !matches!(self, StreamOutcome::Failed(_))
    }
}

/// Statistics from scraping a single channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    pub channel: String,
    pub videos: u64,
    pub comments: u64,
    pub bytes: u64,
    pub duration_sec: f64,
    pub status: ChannelStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
    Ok,
    Failed,
}

impl ChannelStats {
    pub fn ok(channel: String, videos: u64, comments: u64, bytes: u64, duration_sec: f64) -> Self {
        Self {
            channel,
            videos,
            comments,
            bytes,
            duration_sec,
            status: ChannelStatus::Ok,
            error: None,
        }
    }

    pub fn failed(channel: String, error: String) -> Self {
        Self {
            channel,
            videos: 0,
            comments: 0,
            bytes: 0,
            duration_sec: 0.0,
            status: ChannelStatus::Failed,
            error: Some(error),
        }
    }
}

/// Summary report for a batch run over a channels file.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: String,
    pub finished_at: String,
    pub channels_total: u64,
    pub channels_ok: u64,
    pub channels_failed: u64,
    pub total_videos: u64,
    pub total_comments: u64,
    pub total_bytes: u64,
    pub total_duration_sec: f64,
}
