//! Project configuration.
//!
//! A project directory optionally carries a `ytgrab.yaml` with defaults for
//! the common flags, and a `channels.txt` listing channels for batch runs.
//! Missing or unreadable config falls back to defaults rather than failing:
//! configuration is a convenience, not a requirement.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::scrape::SortOrder;
use crate::utils::progress::{print_success, print_warning};

/// Default config file name, resolved against the working directory.
pub const CONFIG_FILE: &str = "ytgrab.yaml";

/// Default channels file name for batch runs.
pub const CHANNELS_FILE: &str = "channels.txt";

const CHANNELS_TEMPLATE: &str = "\
# Channels to scrape, one per line.
# Supported forms:
#   @handle
#   https://www.youtube.com/@handle
#   https://www.youtube.com/channel/UC...
#   UC... (channel id)
#
# Lines starting with # are ignored.
";

/// Settings read from `ytgrab.yaml`, all optional on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory scraped data lands in.
    pub output_dir: PathBuf,
    /// UI language requested from the host.
    pub language: String,
    /// Default comment sort order.
    pub comment_sort: SortLabel,
}

/// Sort order as it appears in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortLabel {
    #[default]
    Recent,
    Popular,
}

impl From<SortLabel> for SortOrder {
    fn from(label: SortLabel) -> Self {
        match label {
            SortLabel::Recent => SortOrder::Recent,
            SortLabel::Popular => SortOrder::Popular,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            language: "en".to_string(),
            comment_sort: SortLabel::Recent,
        }
    }
}

/// Load settings from `path` (or [`CONFIG_FILE`]). A missing file is the
/// defaults; a malformed file warns and falls back to defaults.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let path = path.unwrap_or(Path::new(CONFIG_FILE));
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => return Settings::default(),
    };
    match serde_yaml::from_str(&contents) {
        Ok(settings) => settings,
        Err(err) => {
            warn!("failed to parse {}: {err}; using defaults", path.display());
            Settings::default()
        }
    }
}

/// Write settings to `path` (or [`CONFIG_FILE`]).
pub fn save_settings(settings: &Settings, path: Option<&Path>) -> anyhow::Result<()> {
    let path = path.unwrap_or(Path::new(CONFIG_FILE));
    let contents = serde_yaml::to_string(settings)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Initialize a project: config file, channels template, output directory.
/// Existing files are left alone.
pub fn init_project(output_dir: Option<&Path>) -> anyhow::Result<()> {
    let mut settings = Settings::default();
    if let Some(dir) = output_dir {
        settings.output_dir = dir.to_path_buf();
    }

    std::fs::create_dir_all(&settings.output_dir)?;

    if Path::new(CONFIG_FILE).exists() {
        print_warning(&format!("Config file already exists: ./{CONFIG_FILE}"));
    } else {
        save_settings(&settings, None)?;
        print_success(&format!("Config file: ./{CONFIG_FILE}"));
    }

    if Path::new(CHANNELS_FILE).exists() {
        print_warning(&format!("Channels file already exists: ./{CHANNELS_FILE}"));
    } else {
        std::fs::write(CHANNELS_FILE, CHANNELS_TEMPLATE)?;
        print_success(&format!("Channels file: ./{CHANNELS_FILE}"));
    }

    print_success("Project initialized");
    print_success(&format!(
        "Output directory: ./{}",
        settings.output_dir.display()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = load_settings(Some(Path::new("/nonexistent/ytgrab.yaml")));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.output_dir, PathBuf::from("data"));
        assert_eq!(settings.language, "en");
    }

    #[test]
    fn partial_config_merges_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "language: de").unwrap();
        file.flush().unwrap();

        let settings = load_settings(Some(file.path()));
        assert_eq!(settings.language, "de");
        assert_eq!(settings.output_dir, PathBuf::from("data"));
        assert_eq!(settings.comment_sort, SortLabel::Recent);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "language: [this is not").unwrap();
        file.flush().unwrap();

        assert_eq!(load_settings(Some(file.path())), Settings::default());
    }

    #[test]
    fn settings_round_trip_through_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ytgrab.yaml");
        let settings = Settings {
            comment_sort: SortLabel::Popular,
            ..Settings::default()
        };

        save_settings(&settings, Some(&path)).unwrap();
        assert_eq!(load_settings(Some(&path)), settings);
    }

    #[test]
    fn sort_labels_map_to_engine_sort() {
        assert_eq!(SortOrder::from(SortLabel::Recent), SortOrder::Recent);
        assert_eq!(SortOrder::from(SortLabel::Popular), SortOrder::Popular);
    }
}
