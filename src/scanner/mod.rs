//! Location scanner.
//!
//! Walks a location's input tree and lists the video files in it, relative to
//! the tree root, in a stable order.

use framesmith_common::paths::{has_extension, is_hidden};
use framesmith_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// List every regular file under `root` whose extension is in `allowed`.
///
/// Entries are visited in file-name order per directory, so the result is
/// deterministic. Hidden files and directories are skipped. Any entry that
/// cannot be read fails the whole scan.
pub fn scan(root: &Path, allowed: &[String]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::scan(root, "not a readable directory"));
    }

    let mut videos = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()));

    for entry in walker {
        let entry = entry.map_err(|e| Error::scan(root, e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !has_extension(entry.path(), allowed) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::scan(root, e.to_string()))?;
        videos.push(relative.to_path_buf());
    }

    debug!(root = %root.display(), count = videos.len(), "scan complete");
    Ok(videos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"x").unwrap();
    }

    fn allowed(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let dir = tempdir().unwrap();
        for rel in [
            "b.mkv",
            "a.avi",
            "notes.txt",
            "cover.jpg",
            "season1/ep2.MKV",
            "season1/ep1.Avi",
            "season1/extras/poster.jpg",
        ] {
            touch(dir.path(), rel);
        }
        std::fs::create_dir_all(dir.path().join("empty.mkv")).unwrap();

        let found = scan(dir.path(), &allowed(&["avi", "MKV"])).unwrap();
        assert_eq!(
            found,
            vec![
                PathBuf::from("a.avi"),
                PathBuf::from("b.mkv"),
                PathBuf::from("season1/ep1.Avi"),
                PathBuf::from("season1/ep2.MKV"),
            ]
        );
    }

    #[test]
    fn test_scan_skips_hidden() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "movie.mkv");
        touch(dir.path(), ".movie.mkv");
        touch(dir.path(), ".partial/other.mkv");

        let found = scan(dir.path(), &allowed(&["mkv"])).unwrap();
        assert_eq!(found, vec![PathBuf::from("movie.mkv")]);
    }

    #[test]
    fn test_scan_empty_and_missing_root() {
        let dir = tempdir().unwrap();
        assert!(scan(dir.path(), &allowed(&["mkv"])).unwrap().is_empty());

        let missing = dir.path().join("missing");
        assert_matches!(
            scan(&missing, &allowed(&["mkv"])),
            Err(Error::Scan { root, .. }) if root == missing
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_fails_on_unreadable_subdir() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        touch(dir.path(), "ok.mkv");
        touch(dir.path(), "locked/inner.mkv");
        let locked = dir.path().join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits, so only assert when access is really denied
        let denied = std::fs::read_dir(&locked).is_err();
        let result = scan(dir.path(), &allowed(&["mkv"]));
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        if denied {
            assert_matches!(result, Err(Error::Scan { .. }));
        }
    }
}
