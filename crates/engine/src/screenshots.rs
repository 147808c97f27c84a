use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

pub const SCREENSHOT_EXTENSION: &str = "png";
pub const AUTO_SCREENSHOT_PREFIX: &str = "auto/autoscreen";
pub const AUTO_STAT_SCREENSHOT_PREFIX: &str = "auto/stat";
pub const DEFAULT_SCREENSHOT_STEM: &str = "screenshot";

/// `<stem>_<unix millis, zero padded>`; the padding keeps name order equal to
/// capture order.
pub fn timestamped_name(stem: &str, now: SystemTime) -> String {
    let millis = now
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    format!("{stem}_{millis:015}")
}

/// Full path of a new capture: `<dir>/<name>_<millis>.png`, where `name` may
/// carry a sub-directory such as `auto/autoscreen`.
pub fn screenshot_path(screenshots_dir: &Path, name: Option<&str>, now: SystemTime) -> PathBuf {
    let stem = timestamped_name(name.unwrap_or(DEFAULT_SCREENSHOT_STEM), now);
    screenshots_dir.join(format!("{stem}.{SCREENSHOT_EXTENSION}"))
}

/// Splits `auto/stat` into the `auto` sub-directory and the `stat` file prefix.
pub fn split_prefix(screenshots_dir: &Path, prefix: &str) -> (PathBuf, String) {
    let relative = Path::new(prefix);
    let dir = match relative.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => screenshots_dir.join(parent),
        _ => screenshots_dir.to_path_buf(),
    };
    let file_prefix = relative
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (dir, file_prefix)
}

/// Removes the oldest files named `<prefix>*.<extension>` in `dir` until at
/// most `max` remain. `max == 0` keeps everything. Returns the number removed.
pub fn cleanup_collection(
    dir: &Path,
    prefix: &str,
    extension: &str,
    max: usize,
) -> io::Result<usize> {
    if max == 0 {
        return Ok(0);
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(error) => return Err(error),
    };

    let mut matching = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let has_extension = Path::new(&name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if name.starts_with(prefix) && has_extension {
            matching.push(name);
        }
    }

    if matching.len() <= max {
        return Ok(0);
    }

    matching.sort();
    let excess = matching.len() - max;
    let mut removed = 0;
    for name in matching.into_iter().take(excess) {
        let path = dir.join(&name);
        match fs::remove_file(&path) {
            Ok(()) => {
                removed += 1;
                debug!(path = %path.display(), "auto_screenshot_removed");
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "auto_screenshot_remove_failed");
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"png").expect("write");
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    #[test]
    fn keeps_only_newest_matching_files() {
        let temp = tempfile::tempdir().expect("temp dir");
        for millis in [100u64, 300, 200, 500, 400] {
            let name = timestamped_name("stat", UNIX_EPOCH + Duration::from_millis(millis));
            touch(temp.path(), &format!("{name}.png"));
        }
        touch(temp.path(), "autoscreen_000000000000001.png");
        touch(temp.path(), "stat_notes.txt");

        let removed = cleanup_collection(temp.path(), "stat", "png", 2).expect("cleanup");

        assert_eq!(removed, 3);
        assert_eq!(
            names(temp.path()),
            vec![
                "autoscreen_000000000000001.png",
                "stat_000000000000400.png",
                "stat_000000000000500.png",
                "stat_notes.txt",
            ]
        );
    }

    #[test]
    fn zero_max_keeps_everything() {
        let temp = tempfile::tempdir().expect("temp dir");
        for index in 0..4 {
            touch(temp.path(), &format!("stat_{index}.png"));
        }

        assert_eq!(cleanup_collection(temp.path(), "stat", "png", 0).expect("cleanup"), 0);
        assert_eq!(names(temp.path()).len(), 4);
    }

    #[test]
    fn missing_directory_is_not_an_error() {
        let temp = tempfile::tempdir().expect("temp dir");
        let removed = cleanup_collection(&temp.path().join("auto"), "stat", "png", 1)
            .expect("cleanup");
        assert_eq!(removed, 0);
    }

    #[test]
    fn prefix_splits_into_directory_and_stem() {
        let root = Path::new("shots");
        assert_eq!(
            split_prefix(root, AUTO_STAT_SCREENSHOT_PREFIX),
            (root.join("auto"), "stat".to_string())
        );
        assert_eq!(
            split_prefix(root, "plain"),
            (root.to_path_buf(), "plain".to_string())
        );
    }

    #[test]
    fn screenshot_path_lands_in_prefix_directory() {
        let root = Path::new("shots");
        let at = UNIX_EPOCH + Duration::from_millis(42);
        assert_eq!(
            screenshot_path(root, Some(AUTO_SCREENSHOT_PREFIX), at),
            root.join("auto").join("autoscreen_000000000000042.png")
        );
        assert_eq!(
            screenshot_path(root, None, at),
            root.join("screenshot_000000000000042.png")
        );
    }

    #[test]
    fn timestamped_names_sort_chronologically() {
        let earlier = timestamped_name("x", UNIX_EPOCH + Duration::from_millis(999));
        let later = timestamped_name("x", UNIX_EPOCH + Duration::from_millis(1_000));
        assert!(earlier < later);
    }
}
