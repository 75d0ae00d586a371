//! External tool detection.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a configured tool is available and get its version line.
///
/// `configured` may be an absolute path or a bare name looked up on `PATH`.
/// ffmpeg and ffprobe both answer `-version`.
///
/// # Example
///
/// ```no_run
/// use framesmith_av::check_tool;
/// use std::path::Path;
///
/// let info = check_tool("ffprobe", Path::new("/usr/bin/ffprobe"));
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool(name: &str, configured: &Path) -> ToolInfo {
    let Ok(path) = resolve_binary(name, configured) else {
        return ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        };
    };

    let result = Command::new(&path)
        .arg("-version")
        .stdin(Stdio::null())
        .output();

    match result {
        Ok(output) if output.status.success() => ToolInfo {
            name: name.to_string(),
            available: true,
            version: String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.trim().to_string()),
            path: Some(path),
        },
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: Some(path),
        },
    }
}

/// Resolve a configured binary to an existing path.
///
/// Paths with more than one component must exist as given. A bare name is
/// looked up on `PATH`.
///
/// # Errors
///
/// Returns [`Error::ToolNotFound`] if the binary cannot be located.
pub fn resolve_binary(name: &str, configured: &Path) -> Result<PathBuf> {
    if configured.as_os_str().is_empty() {
        return Err(Error::tool_not_found(name));
    }

    if configured.components().count() > 1 {
        if configured.is_file() {
            return Ok(configured.to_path_buf());
        }
        return Err(Error::tool_not_found(format!(
            "{name} ({})",
            configured.display()
        )));
    }

    which::which(configured).map_err(|_| Error::tool_not_found(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_check_tool_not_found() {
        let info = check_tool("ffmpeg", Path::new("/nonexistent/ffmpeg_12345"));
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_resolve_binary_missing_path() {
        let err = resolve_binary("ffprobe", Path::new("/nonexistent/bin/ffprobe")).unwrap_err();
        assert_matches!(err, Error::ToolNotFound { .. });
        assert!(err.to_string().contains("/nonexistent/bin/ffprobe"));
    }

    #[test]
    fn test_resolve_binary_empty() {
        assert!(resolve_binary("ffmpeg", Path::new("")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_binary_bare_name() {
        // `sh` is on PATH on every unix test host.
        let path = resolve_binary("sh", Path::new("sh")).unwrap();
        assert!(path.is_absolute());
    }
}
