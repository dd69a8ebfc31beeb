//! Terminal status output.
//!
//! Scrapes run for hours; these helpers keep the console informative
//! without drowning it. Structured logging goes through `tracing`, human
//! progress goes through here.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Print a step in progress.
pub fn print_step(message: &str) {
    println!("{} {message}", style("▶").cyan());
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {message}", style("✔").green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {message}", style("⚠").yellow());
}

/// Print an error message to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {message}", style("✗").red());
}

/// One `[NNN/NNN] video — status` progress line.
pub fn print_video_progress(index: u64, total: u64, video_id: &str, status: &str) {
    println!("[{index:03}/{total:03}] {video_id} — {status}");
}

/// Progress bar for one video's comments. Spinner-only when the host did
/// not advertise a total.
pub fn comment_progress_bar(expected: Option<u64>) -> ProgressBar {
    match expected {
        Some(total) => {
            let bar = ProgressBar::new(total);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("  [{bar:30.cyan/blue}] {pos}/{len} comments ({eta})")
                    .expect("static template")
                    .progress_chars("█▓░"),
            );
            bar
        }
        None => {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::default_spinner()
                    .template("  {spinner:.cyan} {pos} comments")
                    .expect("static template"),
            );
            bar
        }
    }
}

/// Format a number with thousands separators.
pub fn format_number(num: u64) -> String {
    let digits = num.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a byte count for summaries.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_group_by_thousands() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_000), "1,000");
        assert_eq!(format_number(28_999_123), "28,999,123");
    }

    #[test]
    fn bytes_scale_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2_048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }
}
