use crate::config::OverlayError;

/// Anything that can go wrong while converting a location.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The configuration handed to the pipeline is unusable.
    #[error("configuration error: {0}")]
    Config(String),

    /// Probe, template or transcode failure.
    #[error(transparent)]
    Av(#[from] framesmith_av::Error),

    /// Scan or file move failure.
    #[error(transparent)]
    Common(#[from] framesmith_common::Error),

    #[error(transparent)]
    Overlay(#[from] OverlayError),
}

impl PipelineError {
    /// Fatal errors stop the run; everything else is scoped to one video or
    /// one location.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Av(e) => e.is_config_error(),
            Self::Common(_) | Self::Overlay(_) => false,
        }
    }

    /// Command line attached to a failed transcode, if any.
    pub fn command(&self) -> Option<&[String]> {
        match self {
            Self::Av(framesmith_av::Error::Transcode { command, .. }) => Some(command),
            _ => None,
        }
    }
}
