//! The `videos` command: channel metadata to a single file.

use std::path::Path;

use serde_json::{json, Value};

use crate::models::StreamOutcome;
use crate::scrape::ChannelVideosScraper;
use crate::storage::writers::{scrape_timestamp, write_json, write_videos_csv, SOURCE};
use crate::storage::OutputFormat;
use crate::utils::progress::{format_number, print_step, print_success, print_warning};

pub async fn run(
    channel: &str,
    output: &Path,
    max_videos: Option<u64>,
    language: &str,
    format: OutputFormat,
    debug: bool,
) -> anyhow::Result<()> {
    print_step(&format!("Fetching channel: {channel}"));

    let scraper = ChannelVideosScraper::new(language, debug);
    let stream = scraper.stream(channel, max_videos).await?;
    let (videos, outcome) = stream.collect().await;

    if let StreamOutcome::Failed(err) = &outcome {
        print_warning(&format!(
            "Listing ended early with {} videos collected: {err}",
            videos.len()
        ));
    }

    let rows: Vec<Value> = videos
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    match format {
        OutputFormat::Csv => {
            write_videos_csv(output, &rows)?;
        }
        OutputFormat::Json | OutputFormat::Jsonl => {
            let document = json!({
                "channel_id": channel,
                "total_videos": videos.len(),
                "videos": rows,
                "scraped_at": scrape_timestamp(),
                "source": SOURCE,
            });
            write_json(output, &document)?;
        }
    }

    print_success(&format!("Found {} videos", format_number(videos.len() as u64)));
    print_success(&format!("Saved to {}", output.display()));
    Ok(())
}
