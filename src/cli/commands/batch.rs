//! The `batch` command: scrape every channel in a channels file.
//!
//! One failed channel never stops the run; it is recorded in the report and
//! the batch moves on.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;

use super::channel::{scrape_channel, ChannelScrapeOptions};
use crate::config::CHANNELS_FILE;
use crate::models::{BatchReport, ChannelStats, ChannelStatus};
use crate::scrape::SortOrder;
use crate::storage::writers::{scrape_timestamp, write_json};
use crate::storage::OutputFormat;
use crate::utils::channels::parse_channels_file;
use crate::utils::progress::{
    format_bytes, format_number, print_error, print_step, print_success,
};

pub struct BatchOptions {
    pub channels_file: Option<PathBuf>,
    pub base_dir: PathBuf,
    pub max_videos: Option<u64>,
    pub per_video_limit: Option<u64>,
    pub sort: SortOrder,
    pub language: String,
    pub format: OutputFormat,
    pub resume: bool,
    pub debug: bool,
}

pub async fn run(options: BatchOptions) -> anyhow::Result<()> {
    let channels_path = options
        .channels_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(CHANNELS_FILE));
    let channels = parse_channels_file(&channels_path)
        .with_context(|| format!("reading {}", channels_path.display()))?;

    if channels.is_empty() {
        anyhow::bail!("no channels found in {}", channels_path.display());
    }

    let started = Instant::now();
    let started_at = scrape_timestamp();
    print_step(&format!(
        "Scraping {} channels from {}",
        channels.len(),
        channels_path.display()
    ));

    let total = channels.len();
    let mut stats: Vec<ChannelStats> = Vec::with_capacity(total);

    for (index, channel) in channels.iter().enumerate() {
        print_step(&format!("[{}/{total}] {channel}", index + 1));

        let channel_options = ChannelScrapeOptions {
            channel_ref: channel.clone(),
            out_dir: None,
            base_dir: options.base_dir.clone(),
            max_videos: options.max_videos,
            per_video_limit: options.per_video_limit,
            sort: options.sort,
            language: options.language.clone(),
            format: options.format,
            videos_only: false,
            dry_run: false,
            resume: options.resume,
            debug: options.debug,
            quiet: true,
        };

        match scrape_channel(&channel_options).await {
            Ok(channel_stats) => {
                print_success(&format!(
                    "{channel}: {} videos, {} comments, {}",
                    format_number(channel_stats.videos),
                    format_number(channel_stats.comments),
                    format_bytes(channel_stats.bytes)
                ));
                stats.push(channel_stats);
            }
            Err(err) => {
                print_error(&format!("{channel}: {err:#}"));
                stats.push(ChannelStats::failed(channel.clone(), format!("{err:#}")));
            }
        }
    }

    let report = BatchReport {
        started_at,
        finished_at: scrape_timestamp(),
        channels_total: total as u64,
        channels_ok: stats
            .iter()
            .filter(|s| s.status == ChannelStatus::Ok)
            .count() as u64,
        channels_failed: stats
            .iter()
            .filter(|s| s.status == ChannelStatus::Failed)
            .count() as u64,
        total_videos: stats.iter().map(|s| s.videos).sum(),
        total_comments: stats.iter().map(|s| s.comments).sum(),
        total_bytes: stats.iter().map(|s| s.bytes).sum(),
        total_duration_sec: started.elapsed().as_secs_f64(),
    };

    let report_path = options.base_dir.join("batch_report.json");
    let mut document = serde_json::to_value(&report)?;
    if let Some(map) = document.as_object_mut() {
        map.insert("channels".to_string(), serde_json::to_value(&stats)?);
    }
    write_json(&report_path, &document)?;

    print_success(&format!(
        "Batch done: {}/{} channels ok, {} videos, {} comments, {}",
        report.channels_ok,
        report.channels_total,
        format_number(report.total_videos),
        format_number(report.total_comments),
        format_bytes(report.total_bytes)
    ));
    print_success(&format!("Report: {}", report_path.display()));

    if report.channels_failed > 0 {
        print_error(&format!("{} channels failed", report.channels_failed));
    }
    Ok(())
}
