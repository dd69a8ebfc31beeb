//! The whole-channel pipeline: video metadata plus per-video comments.
//!
//! Shared by the `channel` command and each iteration of `batch`.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use serde_json::{json, Value};
use tracing::info;

use crate::models::{ChannelStats, StreamOutcome, VideoRecord};
use crate::scrape::{ChannelVideosScraper, CommentThreadScraper, SortOrder};
use crate::storage::paths::{
    channel_comments_dir, channel_output_dir, channel_videos_path, video_comments_filename,
};
use crate::storage::resume::should_skip_existing;
use crate::storage::writers::{
    scrape_timestamp, stamp_record, write_json, write_videos_csv, RecordWriter, SOURCE,
};
use crate::storage::OutputFormat;
use crate::utils::progress::{
    comment_progress_bar, format_number, print_step, print_success, print_video_progress,
    print_warning,
};

/// Everything one channel scrape needs to know.
pub struct ChannelScrapeOptions {
    pub channel_ref: String,
    /// Explicit output directory; defaults to `<base_dir>/<channel>`.
    pub out_dir: Option<PathBuf>,
    pub base_dir: PathBuf,
    pub max_videos: Option<u64>,
    pub per_video_limit: Option<u64>,
    pub sort: SortOrder,
    pub language: String,
    pub format: OutputFormat,
    pub videos_only: bool,
    pub dry_run: bool,
    pub resume: bool,
    pub debug: bool,
    /// Suppress per-video console output (batch mode).
    pub quiet: bool,
}

/// The `channel` command.
pub async fn run(options: &ChannelScrapeOptions) -> anyhow::Result<()> {
    let stats = scrape_channel(options).await?;
    print_success("Done!");
    print_success(&format!(
        "{} videos, {} comments",
        format_number(stats.videos),
        format_number(stats.comments)
    ));
    Ok(())
}

/// Scrape one channel end to end and report its statistics.
pub async fn scrape_channel(options: &ChannelScrapeOptions) -> anyhow::Result<ChannelStats> {
    let started = Instant::now();

    let out_dir = options
        .out_dir
        .clone()
        .unwrap_or_else(|| channel_output_dir(&options.channel_ref, &options.base_dir));

    if !options.dry_run && !options.resume && out_dir.exists() {
        if !options.quiet {
            print_step(&format!(
                "Removing existing data for {}",
                options.channel_ref
            ));
        }
        std::fs::remove_dir_all(&out_dir)
            .with_context(|| format!("removing {}", out_dir.display()))?;
    }

    // 1) Video metadata.
    if !options.quiet {
        print_step(&format!("Fetching channel: {}", options.channel_ref));
    }

    let scraper = ChannelVideosScraper::new(&options.language, options.debug);
    let stream = scraper
        .stream(&options.channel_ref, options.max_videos)
        .await?;
    let (videos, outcome) = stream.collect().await;

    if let StreamOutcome::Failed(err) = &outcome {
        print_warning(&format!(
            "Listing ended early with {} videos collected: {err}",
            videos.len()
        ));
    }
    if !options.quiet {
        print_success(&format!("Found {} videos", format_number(videos.len() as u64)));
    }

    if options.dry_run {
        if !options.quiet {
            print_success(&format!("{} videos found", format_number(videos.len() as u64)));
            print_success("No files written (dry-run mode)");
        }
        return Ok(ChannelStats::ok(
            options.channel_ref.clone(),
            videos.len() as u64,
            0,
            0,
            started.elapsed().as_secs_f64(),
        ));
    }

    std::fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let videos_path = write_videos_file(&out_dir, &options.channel_ref, &videos, options.format)?;
    let mut total_bytes = file_size(&videos_path);

    if options.videos_only {
        return Ok(ChannelStats::ok(
            options.channel_ref.clone(),
            videos.len() as u64,
            0,
            total_bytes,
            started.elapsed().as_secs_f64(),
        ));
    }

    // 2) Comments, one file per video.
    let comments_dir = channel_comments_dir(&out_dir);
    std::fs::create_dir_all(&comments_dir)?;

    if !options.quiet {
        print_step("Processing videos");
    }

    let total_videos = videos.len() as u64;
    let mut total_comments: u64 = 0;

    for video in &videos {
        let filename = video_comments_filename(video.order, &video.video_id, options.format);
        let out_path = comments_dir.join(filename);

        if should_skip_existing(&out_path, options.resume) {
            info!("skipping {} (already scraped)", video.video_id);
            total_bytes += file_size(&out_path);
            continue;
        }

        match scrape_video_comments(video, &out_path, options, total_videos).await {
            Ok(wrote) => {
                total_comments += wrote;
                total_bytes += file_size(&out_path);
            }
            Err(err) => {
                if !options.quiet {
                    print_video_progress(
                        video.order,
                        total_videos,
                        &video.video_id,
                        &format!("error: {err}"),
                    );
                }
                if options.debug {
                    return Err(err);
                }
            }
        }
    }

    Ok(ChannelStats::ok(
        options.channel_ref.clone(),
        total_videos,
        total_comments,
        total_bytes,
        started.elapsed().as_secs_f64(),
    ))
}

/// Scrape one video's thread into `out_path`, returning rows written.
async fn scrape_video_comments(
    video: &VideoRecord,
    out_path: &std::path::Path,
    options: &ChannelScrapeOptions,
    total_videos: u64,
) -> anyhow::Result<u64> {
    let thread = CommentThreadScraper::new(&options.language, options.sort, options.debug);
    let mut stream = thread
        .stream(&video.video_id, options.per_video_limit)
        .await?;

    if stream.disabled() {
        if !options.quiet {
            print_video_progress(
                video.order,
                total_videos,
                &video.video_id,
                "comments disabled",
            );
        }
        return Ok(0);
    }

    let expected = match (options.per_video_limit, stream.total_count()) {
        (Some(limit), Some(total)) => Some(limit.min(total)),
        (Some(limit), None) => Some(limit),
        (None, total) => total,
    };
    let bar = (!options.quiet).then(|| comment_progress_bar(expected));

    let mut writer = RecordWriter::create(out_path, options.format)?;
    let scraped_at = scrape_timestamp();

    while let Some(comment) = stream.recv().await {
        let mut value = serde_json::to_value(&comment)?;
        stamp_record(&mut value, &scraped_at);
        writer.write(&value)?;
        if let Some(bar) = &bar {
            bar.inc(1);
        }
    }
    let wrote = writer.finish()?;

    if let Some(bar) = &bar {
        bar.finish_and_clear();
    }

    match stream.finish().await {
        StreamOutcome::Failed(err) => {
            print_warning(&format!(
                "{}: thread ended early with {} comments collected: {err}",
                video.video_id,
                format_number(wrote)
            ));
        }
        _ => {
            if !options.quiet {
                print_video_progress(
                    video.order,
                    total_videos,
                    &video.video_id,
                    &format!("{} comments", format_number(wrote)),
                );
            }
        }
    }

    Ok(wrote)
}

/// Write the channel's videos metadata file and return its path.
fn write_videos_file(
    out_dir: &std::path::Path,
    channel_ref: &str,
    videos: &[VideoRecord],
    format: OutputFormat,
) -> anyhow::Result<PathBuf> {
    let path = channel_videos_path(out_dir, format);
    let rows: Vec<Value> = videos
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    match format {
        OutputFormat::Csv => {
            write_videos_csv(&path, &rows)?;
        }
        OutputFormat::Json | OutputFormat::Jsonl => {
            let document = json!({
                "channel_id": channel_ref,
                "total_videos": videos.len(),
                "videos": rows,
                "scraped_at": scrape_timestamp(),
                "source": SOURCE,
            });
            write_json(&path, &document)?;
        }
    }
    Ok(path)
}

fn file_size(path: &std::path::Path) -> u64 {
    std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}
