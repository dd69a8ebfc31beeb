//! Normalization of raw host records into stable output shapes.
//!
//! Every conversion here is total: malformed input degrades a single field
//! to its documented empty/absent value instead of failing the record. The
//! host localizes and reformats display text freely; isolating that drift
//! to individual fields is what keeps multi-hour scrapes alive.

use serde_json::Value;
use tracing::debug;

use super::watch_url;
use crate::models::{CommentRecord, VideoRecord};

/// Toolbar heart state the host uses for uploader-hearted comments.
const HEARTED: &str = "TOOLBAR_HEART_STATE_HEARTED";

/// Build a [`VideoRecord`] from a raw listing entry (a `videoRenderer`-like
/// object). `order` is assigned by the paginator; this function has no
/// side effects and no hidden state.
pub fn normalize_video(raw: &Value, order: u64, channel_id: &str) -> VideoRecord {
    let video_id = raw
        .get("videoId")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let view_count_raw = display_text(raw.get("viewCountText"));
    let length = display_text(raw.get("lengthText"));

    let view_count = parse_view_count(&view_count_raw);
    if view_count.is_none() && !view_count_raw.is_empty() {
        debug!("unparsable view count for {video_id}: {view_count_raw:?}");
    }
    let length_minutes = parse_duration_minutes(&length);
    if length_minutes.is_none() && !length.is_empty() {
        debug!("unparsable duration for {video_id}: {length:?}");
    }

    VideoRecord {
        title: display_text(raw.get("title")),
        order,
        view_count,
        view_count_raw,
        length_minutes,
        length,
        thumbnail_url: best_thumbnail(raw),
        url: if video_id.is_empty() {
            String::new()
        } else {
            watch_url(&video_id)
        },
        channel_id: channel_id.to_string(),
        video_id,
    }
}

/// Build a [`CommentRecord`] from a comment entity payload plus the toolbar
/// state payload it references (joined by the caller).
pub fn normalize_comment(payload: &Value, toolbar_state: Option<&Value>) -> CommentRecord {
    let properties = payload.get("properties");
    let author = payload.get("author");
    let toolbar = payload.get("toolbar");

    let cid = str_at(properties, "commentId");
    let votes = str_at(toolbar, "likeCountNotliked");
    let votes = votes.trim();

    CommentRecord {
        text: properties
            .and_then(|p| p.pointer("/content/content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        time: str_at(properties, "publishedTime"),
        author: str_at(author, "displayName"),
        channel: str_at(author, "channelId"),
        votes: if votes.is_empty() {
            "0".to_string()
        } else {
            votes.to_string()
        },
        replies: count_text(toolbar.and_then(|t| t.get("replyCount"))),
        photo: str_at(author, "avatarThumbnailUrl"),
        heart: toolbar_state
            .and_then(|s| s.get("heartState"))
            .and_then(Value::as_str)
            == Some(HEARTED),
        reply: cid.contains('.'),
        cid,
    }
}

/// Parse localized view-count text (`"123,456 views"`) into an integer.
/// Unparsable input yields `None`; the caller preserves the raw text.
pub fn parse_view_count(text: &str) -> Option<u64> {
    let lowered = text.to_lowercase();
    let stripped = lowered.replace("views", "").replace("view", "");
    parse_compact_count(stripped.trim())
}

/// Parse a comment-count header (`"28,999 Comments"`, `"1.2K"`).
pub fn parse_comment_count(text: &str) -> Option<u64> {
    let lowered = text.to_lowercase();
    let stripped = lowered.replace("comments", "").replace("comment", "");
    parse_compact_count(stripped.trim())
}

/// Parse a count that may be separator-grouped (`28,999`) or compact
/// (`28.9K`, `1.2M`, `3B`).
pub fn parse_compact_count(text: &str) -> Option<u64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let lowered = cleaned.to_lowercase();
    let (number, multiplier) = match lowered.chars().last() {
        Some('k') => (&lowered[..lowered.len() - 1], 1_000.0),
        Some('m') => (&lowered[..lowered.len() - 1], 1_000_000.0),
        Some('b') => (&lowered[..lowered.len() - 1], 1_000_000_000.0),
        _ => (lowered.as_str(), 1.0),
    };

    if multiplier > 1.0 {
        let base: f64 = number.parse().ok()?;
        if base < 0.0 {
            return None;
        }
        Some((base * multiplier) as u64)
    } else {
        number.parse::<u64>().ok()
    }
}

/// Convert a `MM:SS` or `H:MM:SS` display duration into minutes.
pub fn parse_duration_minutes(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        return None;
    }
    let mut seconds: u64 = 0;
    for part in parts {
        let value: u64 = part.trim().parse().ok()?;
        seconds = seconds * 60 + value;
    }
    Some(seconds as f64 / 60.0)
}

/// Flatten the host's text container shape (`simpleText` or `runs`) into a
/// plain string. Missing input becomes the empty string.
pub fn display_text(node: Option<&Value>) -> String {
    let Some(node) = node else {
        return String::new();
    };
    if let Some(simple) = node.get("simpleText").and_then(Value::as_str) {
        return simple.to_string();
    }
    if let Some(runs) = node.get("runs").and_then(Value::as_array) {
        return runs
            .iter()
            .filter_map(|run| run.get("text").and_then(Value::as_str))
            .collect();
    }
    String::new()
}

fn best_thumbnail(raw: &Value) -> String {
    // Thumbnails are listed smallest first; take the last.
    raw.pointer("/thumbnail/thumbnails")
        .and_then(Value::as_array)
        .and_then(|list| list.last())
        .and_then(|thumb| thumb.get("url"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn str_at(node: Option<&Value>, key: &str) -> String {
    node.and_then(|n| n.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn count_text(node: Option<&Value>) -> String {
    match node {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn view_count_parses_grouped_integers() {
        assert_eq!(parse_view_count("123,456 views"), Some(123_456));
        assert_eq!(parse_view_count("1 view"), Some(1));
    }

    #[test]
    fn view_count_unparsable_is_absent() {
        assert_eq!(parse_view_count("No views"), None);
        assert_eq!(parse_view_count(""), None);
    }

    #[test]
    fn compact_counts_accept_suffixes() {
        assert_eq!(parse_compact_count("28.9K"), Some(28_900));
        assert_eq!(parse_compact_count("1.2M"), Some(1_200_000));
        assert_eq!(parse_compact_count("3B"), Some(3_000_000_000));
        assert_eq!(parse_comment_count("28,999 Comments"), Some(28_999));
    }

    #[test]
    fn duration_examples_from_the_contract() {
        let minutes = parse_duration_minutes("10:25").unwrap();
        assert!((minutes - 10.41666).abs() < 1e-3);
        let minutes = parse_duration_minutes("1:02:03").unwrap();
        assert!((minutes - 62.05).abs() < 1e-9);
    }

    #[test]
    fn duration_malformed_is_absent() {
        assert_eq!(parse_duration_minutes(""), None);
        assert_eq!(parse_duration_minutes("LIVE"), None);
        assert_eq!(parse_duration_minutes("1:2:3:4"), None);
    }

    fn sample_renderer() -> Value {
        json!({
            "videoId": "dQw4w9WgXcQ",
            "title": {"runs": [{"text": "Never "}, {"text": "Gonna"}]},
            "viewCountText": {"simpleText": "123,456 views"},
            "lengthText": {"simpleText": "3:33"},
            "thumbnail": {"thumbnails": [
                {"url": "small.jpg"}, {"url": "large.jpg"}
            ]},
        })
    }

    #[test]
    fn video_normalization_fills_every_field() {
        let record = normalize_video(&sample_renderer(), 7, "UCchannel");
        assert_eq!(record.video_id, "dQw4w9WgXcQ");
        assert_eq!(record.title, "Never Gonna");
        assert_eq!(record.order, 7);
        assert_eq!(record.view_count, Some(123_456));
        assert_eq!(record.view_count_raw, "123,456 views");
        assert_eq!(record.length, "3:33");
        assert!(record.length_minutes.is_some());
        assert_eq!(record.thumbnail_url, "large.jpg");
        assert_eq!(record.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(record.channel_id, "UCchannel");
    }

    #[test]
    fn video_normalization_is_pure() {
        let raw = sample_renderer();
        assert_eq!(
            normalize_video(&raw, 3, "UC"),
            normalize_video(&raw, 3, "UC")
        );
    }

    #[test]
    fn video_normalization_degrades_missing_fields() {
        let record = normalize_video(&json!({}), 1, "UC");
        assert_eq!(record.video_id, "");
        assert_eq!(record.title, "");
        assert_eq!(record.view_count, None);
        assert_eq!(record.view_count_raw, "");
        assert_eq!(record.length_minutes, None);
        assert_eq!(record.url, "");
    }

    fn sample_comment() -> Value {
        json!({
            "properties": {
                "commentId": "UgxAbc",
                "content": {"content": "great video"},
                "publishedTime": "2 years ago",
                "toolbarStateKey": "state-key",
            },
            "author": {
                "displayName": "@someone",
                "channelId": "UCauthor",
                "avatarThumbnailUrl": "avatar.jpg",
            },
            "toolbar": {
                "likeCountNotliked": " 41 ",
                "replyCount": "3",
            },
        })
    }

    #[test]
    fn comment_normalization_joins_toolbar_state() {
        let state = json!({"key": "state-key", "heartState": "TOOLBAR_HEART_STATE_HEARTED"});
        let record = normalize_comment(&sample_comment(), Some(&state));
        assert_eq!(record.cid, "UgxAbc");
        assert_eq!(record.text, "great video");
        assert_eq!(record.time, "2 years ago");
        assert_eq!(record.author, "@someone");
        assert_eq!(record.channel, "UCauthor");
        assert_eq!(record.votes, "41");
        assert_eq!(record.replies, "3");
        assert_eq!(record.photo, "avatar.jpg");
        assert!(record.heart);
        assert!(!record.reply);
    }

    #[test]
    fn reply_flag_comes_from_dotted_ids() {
        let mut raw = sample_comment();
        raw["properties"]["commentId"] = json!("UgxAbc.ReplyId");
        let record = normalize_comment(&raw, None);
        assert!(record.reply);
        assert!(!record.heart);
    }

    #[test]
    fn empty_votes_default_to_zero() {
        let mut raw = sample_comment();
        raw["toolbar"]["likeCountNotliked"] = json!("  ");
        let record = normalize_comment(&raw, None);
        assert_eq!(record.votes, "0");
    }
}
