//! Streaming record writers.
//!
//! Records are written as they arrive from a pagination stream, so a
//! partial scrape still leaves a valid, readable file behind. Every writer
//! reports how many rows it wrote.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// `source` field stamped onto every record.
pub const SOURCE: &str = concat!("ytgrab/", env!("CARGO_PKG_VERSION"));

/// Current UTC timestamp for `scraped_at` fields.
pub fn scrape_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Attach the provenance fields every output record carries.
pub fn stamp_record(record: &mut Value, scraped_at: &str) {
    if let Some(map) = record.as_object_mut() {
        map.insert(
            "scraped_at".to_string(),
            Value::String(scraped_at.to_string()),
        );
        map.insert("source".to_string(), Value::String(SOURCE.to_string()));
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Write one pretty-printed JSON document.
pub fn write_json(path: &Path, payload: &Value) -> Result<()> {
    ensure_parent(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), payload)?;
    Ok(())
}

/// A line-per-record or CSV writer, chosen by output format.
pub enum RecordWriter {
    Jsonl(JsonlWriter),
    Csv(CsvWriter),
}

impl RecordWriter {
    pub fn create(path: &Path, format: super::OutputFormat) -> Result<Self> {
        Ok(match format {
            super::OutputFormat::Csv => RecordWriter::Csv(CsvWriter::create(path)?),
            // A stream of records has no single-document form; json falls
            // back to line-delimited output.
            super::OutputFormat::Jsonl | super::OutputFormat::Json => {
                RecordWriter::Jsonl(JsonlWriter::create(path)?)
            }
        })
    }

    pub fn write(&mut self, record: &Value) -> Result<()> {
        match self {
            RecordWriter::Jsonl(w) => w.write(record),
            RecordWriter::Csv(w) => w.write(record),
        }
    }

    /// Flush and return the number of rows written.
    pub fn finish(self) -> Result<u64> {
        match self {
            RecordWriter::Jsonl(w) => w.finish(),
            RecordWriter::Csv(w) => w.finish(),
        }
    }
}

/// One JSON object per line.
pub struct JsonlWriter {
    inner: BufWriter<File>,
    count: u64,
}

impl JsonlWriter {
    pub fn create(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self {
            inner: BufWriter::new(file),
            count: 0,
        })
    }

    pub fn write(&mut self, record: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.inner, record)?;
        self.inner.write_all(b"\n")?;
        self.count += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<u64> {
        self.inner.flush()?;
        Ok(self.count)
    }
}

/// CSV with a header row derived from the first record's keys (sorted, so
/// output is deterministic). Later records may omit keys; extra keys in
/// later records are ignored, matching the header-first format.
pub struct CsvWriter {
    inner: csv::Writer<File>,
    fields: Option<Vec<String>>,
    count: u64,
}

impl CsvWriter {
    pub fn create(path: &Path) -> Result<Self> {
        ensure_parent(path)?;
        let inner =
            csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self {
            inner,
            fields: None,
            count: 0,
        })
    }

    pub fn write(&mut self, record: &Value) -> Result<()> {
        let empty = serde_json::Map::new();
        let map = record.as_object().unwrap_or(&empty);

        if self.fields.is_none() {
            let mut fields: Vec<String> = map.keys().cloned().collect();
            fields.sort();
            self.inner.write_record(&fields)?;
            self.fields = Some(fields);
        }

        let fields = self.fields.as_ref().expect("set above");
        let row: Vec<String> = fields
            .iter()
            .map(|field| map.get(field).map(value_to_cell).unwrap_or_default())
            .collect();
        self.inner.write_record(&row)?;
        self.count += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<u64> {
        self.inner.flush()?;
        Ok(self.count)
    }
}

/// Header written for an empty videos table, so the file is still a valid
/// CSV documenting its columns.
const VIDEO_FIELDS: &[&str] = &[
    "channel_id",
    "length",
    "length_minutes",
    "order",
    "thumbnail_url",
    "title",
    "url",
    "video_id",
    "view_count",
    "view_count_raw",
];

/// Write the channel videos metadata table as CSV.
pub fn write_videos_csv(path: &Path, videos: &[Value]) -> Result<u64> {
    let mut writer = CsvWriter::create(path)?;
    if videos.is_empty() {
        writer.inner.write_record(VIDEO_FIELDS)?;
        return writer.finish();
    }
    for video in videos {
        writer.write(video)?;
    }
    writer.finish()
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        // Nested structures keep their JSON encoding inside the cell.
        other => other.to_string(),
    }
}
