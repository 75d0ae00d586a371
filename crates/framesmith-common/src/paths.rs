//! Path utilities for matching video files and naming staged outputs.

use std::path::Path;

/// Extensions picked up when the configuration does not list any.
const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["avi", "mkv", "mov"];

/// Default allow-list of video extensions.
///
/// # Examples
///
/// ```
/// use framesmith_common::paths::default_video_extensions;
///
/// assert!(default_video_extensions().contains(&"mkv".to_string()));
/// ```
#[must_use]
pub fn default_video_extensions() -> Vec<String> {
    DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// Lowercase an extension and strip surrounding whitespace and dots.
///
/// # Examples
///
/// ```
/// use framesmith_common::paths::normalize_extension;
///
/// assert_eq!(normalize_extension(" .MKV "), "mkv");
/// assert_eq!(normalize_extension("mp4"), "mp4");
/// ```
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_matches('.').trim().to_lowercase()
}

/// Check whether a path's extension is in the allow-list, ignoring case.
///
/// The allow-list entries are normalised the same way as the path's extension,
/// so `".AVI"` in a config matches `clip.avi`.
///
/// # Examples
///
/// ```
/// use framesmith_common::paths::has_extension;
/// use std::path::Path;
///
/// let allowed = vec!["avi".to_string(), "mkv".to_string()];
/// assert!(has_extension(Path::new("a/b/clip.AVI"), &allowed));
/// assert!(!has_extension(Path::new("notes.txt"), &allowed));
/// assert!(!has_extension(Path::new("no_extension"), &allowed));
/// ```
pub fn has_extension(path: &Path, allowed: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = normalize_extension(ext);
    if ext.is_empty() {
        return false;
    }
    allowed.iter().any(|a| normalize_extension(a) == ext)
}

/// Name of the file a profile produces for `source`: `<stem>.<profile>.<ext>`.
///
/// Dots around `ext` are trimmed. When `ext` is empty after trimming the
/// source file's own extension is used.
pub fn output_file_name(source: &Path, profile: &str, ext: &str) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut ext = ext.trim().trim_matches('.').to_string();
    if ext.is_empty() {
        ext = source
            .extension()
            .map(|e| e.to_string_lossy().trim_matches('.').to_string())
            .unwrap_or_default();
    }
    if ext.is_empty() {
        format!("{stem}.{profile}")
    } else {
        format!("{stem}.{profile}.{ext}")
    }
}

/// Whether a file name is hidden (starts with a dot).
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}
