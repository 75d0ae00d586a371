//! Media file probing module.
//!
//! [`Prober`] is the seam the pipeline depends on; [`FfprobeProber`] is the
//! implementation used in production. Tests substitute their own.

mod ffprobe;
mod types;

pub use ffprobe::{parse_ffprobe_json, FfprobeProber};
pub use types::*;

use crate::Result;
use std::path::Path;

/// Something that can turn a media file into a [`ProbeSummary`].
pub trait Prober: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Probe a media file.
    fn probe(&self, path: &Path) -> Result<ProbeSummary>;
}

impl<P: Prober + ?Sized> Prober for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn probe(&self, path: &Path) -> Result<ProbeSummary> {
        (**self).probe(path)
    }
}
