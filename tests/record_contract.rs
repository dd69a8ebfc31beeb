//! Output-record compatibility contract.
//!
//! Downstream consumers rely on every documented field being present with a
//! stable type in every emitted record. Fields may be added over time,
//! never removed or retyped.

use serde_json::Value;

use ytgrab::models::{CommentRecord, VideoRecord};
use ytgrab::scrape::normalize::{normalize_comment, normalize_video};

const VIDEO_FIELDS: &[&str] = &[
    "video_id",
    "title",
    "order",
    "view_count",
    "view_count_raw",
    "length",
    "length_minutes",
    "thumbnail_url",
    "url",
    "channel_id",
];

const COMMENT_FIELDS: &[&str] = &[
    "cid", "text", "time", "author", "channel", "votes", "replies", "photo", "heart", "reply",
];

fn assert_fields(value: &Value, fields: &[&str]) {
    let map = value.as_object().expect("records serialize as objects");
    for field in fields {
        assert!(map.contains_key(*field), "missing documented field {field}");
    }
}

#[test]
fn video_records_always_carry_every_documented_field() {
    // Even a completely empty raw entry must normalize into a full record.
    let record = normalize_video(&serde_json::json!({}), 1, "");
    assert_fields(&serde_json::to_value(&record).unwrap(), VIDEO_FIELDS);

    let populated = normalize_video(
        &serde_json::json!({
            "videoId": "abc",
            "title": {"simpleText": "t"},
            "viewCountText": {"simpleText": "12 views"},
            "lengthText": {"simpleText": "0:30"},
        }),
        2,
        "UCx",
    );
    assert_fields(&serde_json::to_value(&populated).unwrap(), VIDEO_FIELDS);
}

#[test]
fn comment_records_always_carry_every_documented_field() {
    let record = normalize_comment(&serde_json::json!({}), None);
    assert_fields(&serde_json::to_value(&record).unwrap(), COMMENT_FIELDS);
}

#[test]
fn records_deserialize_back_from_their_own_output() {
    let video = normalize_video(&serde_json::json!({"videoId": "abc"}), 1, "UCx");
    let text = serde_json::to_string(&video).unwrap();
    let back: VideoRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(back, video);

    let comment = normalize_comment(&serde_json::json!({}), None);
    let text = serde_json::to_string(&comment).unwrap();
    let back: CommentRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(back, comment);
}

#[test]
fn absent_numeric_fields_serialize_as_null_not_missing() {
    let record = normalize_video(&serde_json::json!({"videoId": "abc"}), 1, "UCx");
    let value = serde_json::to_value(&record).unwrap();
    assert!(value["view_count"].is_null());
    assert!(value["length_minutes"].is_null());
}
