//! Pipeline orchestration.
//!
//! For every location: scan the input tree, then for each video probe it once,
//! render and run each assigned profile into the tmp tree, and finally promote
//! everything into the output tree or quarantine the original.

mod converter;
mod error;
mod report;

pub use converter::{render_profile, Converter};
pub use error::PipelineError;
pub use report::{LocationOutcome, LocationReport, PassReport, VideoOutcome, VideoReport};
