//! File relocation helpers shared by promotion and quarantine.

use crate::{Error, Result};
use std::path::Path;

/// Create `dir` and any missing parents. Existing directories are left alone.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::filesystem("create directory", dir, e))
}

/// Move a file, creating the destination's parent directory first.
///
/// Tries `rename` and falls back to copy + remove when the two paths are on
/// different filesystems. An existing destination file is replaced.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        ensure_dir(parent)?;
    }

    let rename_err = match std::fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    // EXDEV has no stable ErrorKind; any regular file gets one copy attempt.
    if !from.is_file() {
        return Err(Error::filesystem("move", from, rename_err));
    }
    if std::fs::copy(from, to).is_err() {
        let _ = std::fs::remove_file(to);
        return Err(Error::filesystem("move", from, rename_err));
    }
    std::fs::remove_file(from).map_err(|e| Error::filesystem("remove", from, e))
}

/// Move a file like [`move_file`], but fail if `to` already exists.
pub fn move_new_file(from: &Path, to: &Path) -> Result<()> {
    if to.symlink_metadata().is_ok() {
        return Err(Error::filesystem(
            "move",
            from,
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} already exists", to.display()),
            ),
        ));
    }
    move_file(from, to)
}
