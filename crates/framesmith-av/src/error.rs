//! Error types for framesmith-av.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while probing, rendering or transcoding a single video.
///
/// Apart from [`Error::ToolNotFound`] and [`Error::InvalidFlag`], which are
/// configuration problems, every variant is scoped to one video: the caller
/// quarantines that video and moves on.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// Probing a file failed, either running the tool or decoding its output.
    #[error("probe of {} failed: {message}", path.display())]
    Probe { path: PathBuf, message: String },

    /// No template directory contains the requested template.
    #[error("template \"{name}\" not found")]
    TemplateNotFound { name: String },

    /// The template source is malformed.
    #[error("unable to parse template at offset {offset}: {message}")]
    TemplateParse { offset: usize, message: String },

    /// Rendering the template failed, e.g. a referenced field is missing.
    #[error("unable to execute template: {0}")]
    TemplateExec(String),

    /// The rendered text is not the expected JSON object.
    #[error("unable to decode rendered template: {0}")]
    TemplateDecode(String),

    /// The transcoder was asked to do something it cannot.
    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),

    /// The transcoder exited unsuccessfully.
    #[error("{tool} failed ({status}){}", summary.as_deref().map(|s| format!(": {s}")).unwrap_or_default())]
    Transcode {
        tool: String,
        status: String,
        /// Last non-empty line of stderr.
        summary: Option<String>,
        command: Vec<String>,
    },

    /// A profile parameter was rejected by the flag table.
    #[error("invalid value for {param}: {message}")]
    InvalidFlag { param: String, message: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a probe error.
    pub fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a template parse error at a byte offset of the source.
    pub fn template_parse(offset: usize, message: impl Into<String>) -> Self {
        Self::TemplateParse {
            offset,
            message: message.into(),
        }
    }

    /// Create a template execution error.
    pub fn template_exec(message: impl Into<String>) -> Self {
        Self::TemplateExec(message.into())
    }

    /// Create an invalid flag error.
    pub fn invalid_flag(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFlag {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether this error means the run configuration itself is unusable.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. } | Self::InvalidFlag { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TemplateNotFound {
            name: "x264".into(),
        };
        assert_eq!(err.to_string(), "template \"x264\" not found");

        let err = Error::Transcode {
            tool: "ffmpeg".into(),
            status: "exit status: 1".into(),
            summary: Some("Unknown encoder 'foo'".into()),
            command: vec![],
        };
        assert_eq!(
            err.to_string(),
            "ffmpeg failed (exit status: 1): Unknown encoder 'foo'"
        );

        let err = Error::Transcode {
            tool: "ffmpeg".into(),
            status: "exit status: 1".into(),
            summary: None,
            command: vec![],
        };
        assert_eq!(err.to_string(), "ffmpeg failed (exit status: 1)");
    }

    #[test]
    fn test_config_errors() {
        assert!(Error::tool_not_found("ffprobe").is_config_error());
        assert!(Error::invalid_flag("codec", "nope").is_config_error());
        assert!(!Error::template_exec("missing").is_config_error());
    }
}
