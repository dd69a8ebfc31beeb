//! Channel-reference parsing.
//!
//! Callers hand us channels in whatever form they copied: `@handle`, a full
//! channel URL in either the handle or id form, a bare `/channel/UC…` path,
//! or a raw `UC…` id. Everything normalizes to either `@handle` or the id.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::utils::progress::print_warning;

static HANDLE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/@([a-zA-Z0-9_.-]+)").expect("static regex"));
static CHANNEL_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/channel/(UC[a-zA-Z0-9_-]+)").expect("static regex"));
static CHANNEL_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/?channel/(UC[a-zA-Z0-9_-]+)").expect("static regex"));
static CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^UC[a-zA-Z0-9_-]+$").expect("static regex"));

/// Normalize a channel reference, or `None` when the text matches no known
/// form.
pub fn extract_channel_ref(text: &str) -> Option<String> {
    let text = text.trim();

    if text.starts_with('@') {
        return Some(text.to_string());
    }
    if let Some(caps) = HANDLE_URL.captures(text) {
        return Some(format!("@{}", &caps[1]));
    }
    if let Some(caps) = CHANNEL_URL.captures(text) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = CHANNEL_PATH.captures(text) {
        return Some(caps[1].to_string());
    }
    if CHANNEL_ID.is_match(text) {
        return Some(text.to_string());
    }
    None
}

/// The videos-tab URL for a normalized channel reference.
pub fn channel_videos_url(channel_ref: &str) -> String {
    if let Some(handle) = channel_ref.strip_prefix('@') {
        format!(
            "https://www.youtube.com/@{}/videos",
            urlencoding::encode(handle)
        )
    } else {
        format!(
            "https://www.youtube.com/channel/{}/videos",
            urlencoding::encode(channel_ref)
        )
    }
}

/// Parse a channels file: one reference per line, `#` comments and blank
/// lines skipped, unparseable lines warned about and skipped.
pub fn parse_channels_file(path: &Path) -> std::io::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    let mut channels = Vec::new();

    for (line_num, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match extract_channel_ref(line) {
            Some(channel) => channels.push(channel),
            None => print_warning(&format!(
                "Line {}: skipping invalid channel reference: {line}",
                line_num + 1
            )),
        }
    }

    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn handles_pass_through() {
        assert_eq!(extract_channel_ref("@someone"), Some("@someone".into()));
    }

    #[test]
    fn urls_reduce_to_handle_or_id() {
        assert_eq!(
            extract_channel_ref("https://www.youtube.com/@someone"),
            Some("@someone".into())
        );
        assert_eq!(
            extract_channel_ref("https://www.youtube.com/channel/UCabc123"),
            Some("UCabc123".into())
        );
        assert_eq!(
            extract_channel_ref("/channel/UCabc123"),
            Some("UCabc123".into())
        );
        assert_eq!(extract_channel_ref("UCabc123"), Some("UCabc123".into()));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(extract_channel_ref("not a channel"), None);
        assert_eq!(extract_channel_ref(""), None);
    }

    #[test]
    fn videos_url_for_both_forms() {
        assert_eq!(
            channel_videos_url("@someone"),
            "https://www.youtube.com/@someone/videos"
        );
        assert_eq!(
            channel_videos_url("UCabc123"),
            "https://www.youtube.com/channel/UCabc123/videos"
        );
    }

    #[test]
    fn channels_file_skips_comments_and_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# heading").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "@first").unwrap();
        writeln!(file, "???").unwrap();
        writeln!(file, "https://www.youtube.com/channel/UCxyz").unwrap();
        file.flush().unwrap();

        let channels = parse_channels_file(file.path()).unwrap();
        assert_eq!(channels, vec!["@first".to_string(), "UCxyz".to_string()]);
    }
}
