//! What a pass did, per location and per video.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub locations: Vec<LocationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationReport {
    /// Configured base path of the location.
    pub path: PathBuf,
    pub outcome: LocationOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LocationOutcome {
    /// The location was not processed this pass.
    Skipped { reason: String },
    Processed { videos: Vec<VideoReport> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoReport {
    /// Path relative to the location's input directory.
    pub relative_path: PathBuf,
    pub outcome: VideoOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VideoOutcome {
    /// Derived files (not including the original) now in the output tree.
    Promoted { outputs: Vec<PathBuf> },
    /// The original was moved to the fail tree.
    Quarantined { cause: String },
    /// A move failed; the original is still in the input tree.
    Inconsistent { cause: String },
}

impl LocationReport {
    pub fn videos(&self) -> &[VideoReport] {
        match &self.outcome {
            LocationOutcome::Processed { videos } => videos,
            LocationOutcome::Skipped { .. } => &[],
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, LocationOutcome::Skipped { .. })
    }
}

impl PassReport {
    fn videos(&self) -> impl Iterator<Item = &VideoReport> {
        self.locations.iter().flat_map(|l| l.videos())
    }

    pub fn promoted(&self) -> usize {
        self.videos()
            .filter(|v| matches!(v.outcome, VideoOutcome::Promoted { .. }))
            .count()
    }

    pub fn quarantined(&self) -> usize {
        self.videos()
            .filter(|v| matches!(v.outcome, VideoOutcome::Quarantined { .. }))
            .count()
    }

    pub fn inconsistent(&self) -> usize {
        self.videos()
            .filter(|v| matches!(v.outcome, VideoOutcome::Inconsistent { .. }))
            .count()
    }

    pub fn skipped_locations(&self) -> usize {
        self.locations.iter().filter(|l| l.is_skipped()).count()
    }

    /// One-line summary for the console.
    pub fn summary(&self) -> String {
        let secs = (self.finished_at - self.started_at).num_seconds();
        format!(
            "pass finished in {secs}s: {} promoted, {} quarantined, {} inconsistent, {} location(s) skipped",
            self.promoted(),
            self.quarantined(),
            self.inconsistent(),
            self.skipped_locations()
        )
    }
}
