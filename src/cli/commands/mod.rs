//! CLI parser and command dispatch.

mod batch;
mod channel;
mod comments;
mod init;
mod videos;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;
use crate::scrape::SortOrder;
use crate::storage::OutputFormat;

pub use channel::{scrape_channel, ChannelScrapeOptions};

#[derive(Parser)]
#[command(name = "ytgrab")]
#[command(about = "Channel video and comment-thread extraction")]
#[command(version)]
pub struct Cli {
    /// Config file path (default: ./ytgrab.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the working directory with a config and channels template
    Init {
        /// Output directory to record in the config
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Scrape a channel: videos metadata plus comments for every video
    Channel {
        /// Channel reference (@handle, channel URL, or UC… id)
        channel: String,
        /// Output directory (default: <output_dir>/<channel>)
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Stop after this many videos
        #[arg(long)]
        max_videos: Option<u64>,
        /// Stop each video's comments at this many records
        #[arg(long)]
        limit: Option<u64>,
        /// Comment sort order
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
        /// UI language requested from the host
        #[arg(short, long)]
        language: Option<String>,
        /// Output file format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,
        /// Only fetch video metadata, skip comments
        #[arg(long)]
        videos_only: bool,
        /// Report what would be scraped without writing files
        #[arg(long)]
        dry_run: bool,
        /// Skip videos whose comments file already exists
        #[arg(long)]
        resume: bool,
        /// Mirror raw fetches for post-mortem inspection
        #[arg(long)]
        debug: bool,
    },

    /// Fetch a channel's video metadata to a single file
    Videos {
        /// Channel reference (@handle, channel URL, or UC… id)
        channel: String,
        /// Output file
        #[arg(short, long, default_value = "videos.json")]
        output: PathBuf,
        /// Stop after this many videos
        #[arg(long)]
        max_videos: Option<u64>,
        /// UI language requested from the host
        #[arg(short, long)]
        language: Option<String>,
        /// Output file format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
        /// Mirror raw fetches for post-mortem inspection
        #[arg(long)]
        debug: bool,
    },

    /// Fetch one video's comment thread to a single file
    Comments {
        /// Video id
        video_id: String,
        /// Output file
        #[arg(short, long, default_value = "comments.jsonl")]
        output: PathBuf,
        /// Comment sort order
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
        /// Stop after this many comments
        #[arg(long)]
        limit: Option<u64>,
        /// UI language requested from the host
        #[arg(short, long)]
        language: Option<String>,
        /// Output file format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,
        /// Mirror raw fetches for post-mortem inspection
        #[arg(long)]
        debug: bool,
    },

    /// Scrape every channel listed in a channels file
    Batch {
        /// Channels file (default: ./channels.txt)
        #[arg(long)]
        channels_file: Option<PathBuf>,
        /// Stop after this many videos per channel
        #[arg(long)]
        max_videos: Option<u64>,
        /// Stop each video's comments at this many records
        #[arg(long)]
        limit: Option<u64>,
        /// Comment sort order
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
        /// UI language requested from the host
        #[arg(short, long)]
        language: Option<String>,
        /// Output file format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,
        /// Skip videos whose comments file already exists
        #[arg(long)]
        resume: bool,
        /// Mirror raw fetches for post-mortem inspection
        #[arg(long)]
        debug: bool,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref());

    match cli.command {
        Commands::Init { output_dir } => init::run(output_dir.as_deref()),
        Commands::Channel {
            channel,
            out_dir,
            max_videos,
            limit,
            sort,
            language,
            format,
            videos_only,
            dry_run,
            resume,
            debug,
        } => {
            let options = ChannelScrapeOptions {
                channel_ref: channel,
                out_dir,
                base_dir: settings.output_dir.clone(),
                max_videos,
                per_video_limit: limit,
                sort: sort.unwrap_or_else(|| settings.comment_sort.into()),
                language: language.unwrap_or_else(|| settings.language.clone()),
                format,
                videos_only,
                dry_run,
                resume,
                debug,
                quiet: false,
            };
            channel::run(&options).await
        }
        Commands::Videos {
            channel,
            output,
            max_videos,
            language,
            format,
            debug,
        } => {
            videos::run(
                &channel,
                &output,
                max_videos,
                &language.unwrap_or_else(|| settings.language.clone()),
                format,
                debug,
            )
            .await
        }
        Commands::Comments {
            video_id,
            output,
            sort,
            limit,
            language,
            format,
            debug,
        } => {
            comments::run(
                &video_id,
                &output,
                sort.unwrap_or_else(|| settings.comment_sort.into()),
                limit,
                &language.unwrap_or_else(|| settings.language.clone()),
                format,
                debug,
            )
            .await
        }
        Commands::Batch {
            channels_file,
            max_videos,
            limit,
            sort,
            language,
            format,
            resume,
            debug,
        } => {
            batch::run(batch::BatchOptions {
                channels_file,
                base_dir: settings.output_dir.clone(),
                max_videos,
                per_video_limit: limit,
                sort: sort.unwrap_or_else(|| settings.comment_sort.into()),
                language: language.unwrap_or_else(|| settings.language.clone()),
                format,
                resume,
                debug,
            })
            .await
        }
    }
}
