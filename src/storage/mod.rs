//! On-disk layout and record writers.

pub mod paths;
pub mod resume;
pub mod writers;

/// Output file format for scraped records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line; the default for comment streams.
    #[default]
    Jsonl,
    /// A single JSON document.
    Json,
    /// Comma-separated values with a header row.
    Csv,
}
