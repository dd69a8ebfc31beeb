//! Resume-skip bookkeeping.
//!
//! Resume works at whole-file granularity: a video whose comments file
//! already exists (and is non-empty) is skipped on a `--resume` run.
//! Nothing below the file level is resumable; a partial file is rescraped
//! from page one.

use std::path::Path;

/// Whether to skip writing `path` on this run.
pub fn should_skip_existing(path: &Path, resume: bool) -> bool {
    if !resume {
        return false;
    }
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn existing_nonempty_file_skips_only_with_resume() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "content").unwrap();
        file.flush().unwrap();

        assert!(should_skip_existing(file.path(), true));
        assert!(!should_skip_existing(file.path(), false));
    }

    #[test]
    fn empty_file_is_rescraped() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(!should_skip_existing(file.path(), true));
    }

    #[test]
    fn missing_file_never_skips() {
        let path = Path::new("/nonexistent/ytgrab-test-file.jsonl");
        assert!(!should_skip_existing(path, true));
        assert!(!should_skip_existing(path, false));
    }
}
