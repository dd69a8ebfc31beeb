//! Output path layout.
//!
//! One directory per channel under the base dir:
//!
//! ```text
//! data/<channel>/videos.json
//! data/<channel>/comments/0001_<videoid>.jsonl
//! ```

use std::path::{Path, PathBuf};

use super::OutputFormat;

/// Make a channel ref or video id safe as a directory name.
pub fn sanitize_name(name: &str) -> String {
    name.trim_start_matches('@')
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Directory all of one channel's output lands in.
pub fn channel_output_dir(channel_ref: &str, base_dir: &Path) -> PathBuf {
    base_dir.join(sanitize_name(channel_ref))
}

/// Subdirectory for per-video comment files.
pub fn channel_comments_dir(out_dir: &Path) -> PathBuf {
    out_dir.join("comments")
}

/// The channel's videos metadata file.
pub fn channel_videos_path(out_dir: &Path, format: OutputFormat) -> PathBuf {
    match format {
        OutputFormat::Csv => out_dir.join("videos.csv"),
        // Video metadata is one document, so jsonl degrades to json.
        OutputFormat::Json | OutputFormat::Jsonl => out_dir.join("videos.json"),
    }
}

/// Per-video comments filename, ordered so a directory listing matches the
/// channel's upload order.
pub fn video_comments_filename(order: u64, video_id: &str, format: OutputFormat) -> String {
    let ext = match format {
        OutputFormat::Csv => "csv",
        OutputFormat::Json | OutputFormat::Jsonl => "jsonl",
    };
    format!("{order:04}_{}.{ext}", sanitize_name(video_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_lose_their_at_sign() {
        assert_eq!(sanitize_name("@someone"), "someone");
        let dir = channel_output_dir("@someone", Path::new("data"));
        assert_eq!(dir, Path::new("data").join("someone"));
    }

    #[test]
    fn hostile_characters_become_underscores() {
        assert_eq!(sanitize_name("a/b:c"), "a_b_c");
    }

    #[test]
    fn comment_filenames_sort_by_order() {
        assert_eq!(
            video_comments_filename(1, "abc123", OutputFormat::Jsonl),
            "0001_abc123.jsonl"
        );
        assert_eq!(
            video_comments_filename(42, "xyz789", OutputFormat::Csv),
            "0042_xyz789.csv"
        );
        assert_eq!(
            video_comments_filename(999, "test", OutputFormat::Jsonl),
            "0999_test.jsonl"
        );
    }

    #[test]
    fn videos_path_follows_format() {
        let dir = PathBuf::from("data/someone");
        assert_eq!(
            channel_videos_path(&dir, OutputFormat::Jsonl),
            dir.join("videos.json")
        );
        assert_eq!(
            channel_videos_path(&dir, OutputFormat::Csv),
            dir.join("videos.csv")
        );
    }
}
