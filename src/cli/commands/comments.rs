//! The `comments` command: one video's thread to a single file.

use std::path::Path;

use crate::models::StreamOutcome;
use crate::scrape::{CommentThreadScraper, SortOrder};
use crate::storage::writers::{scrape_timestamp, stamp_record, RecordWriter};
use crate::storage::OutputFormat;
use crate::utils::progress::{
    comment_progress_bar, format_number, print_step, print_success, print_warning,
};

pub async fn run(
    video_id: &str,
    output: &Path,
    sort: SortOrder,
    limit: Option<u64>,
    language: &str,
    format: OutputFormat,
    debug: bool,
) -> anyhow::Result<()> {
    print_step(&format!("Fetching comments for video: {video_id}"));

    let thread = CommentThreadScraper::new(language, sort, debug);
    let mut stream = thread.stream(video_id, limit).await?;

    if stream.disabled() {
        print_warning("Comments are disabled for this video");
        return Ok(());
    }

    let expected = match (limit, stream.total_count()) {
        (Some(limit), Some(total)) => Some(limit.min(total)),
        (Some(limit), None) => Some(limit),
        (None, total) => total,
    };
    let bar = comment_progress_bar(expected);

    let mut writer = RecordWriter::create(output, format)?;
    let scraped_at = scrape_timestamp();

    while let Some(comment) = stream.recv().await {
        let mut value = serde_json::to_value(&comment)?;
        stamp_record(&mut value, &scraped_at);
        writer.write(&value)?;
        bar.inc(1);
    }
    let wrote = writer.finish()?;
    bar.finish_and_clear();

    if let StreamOutcome::Failed(err) = stream.finish().await {
        print_warning(&format!(
            "Thread ended early with {} comments collected: {err}",
            format_number(wrote)
        ));
    }

    print_success(&format!("Downloaded {} comments", format_number(wrote)));
    print_success(&format!("Saved to {}", output.display()));
    Ok(())
}
