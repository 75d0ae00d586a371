//! Media information types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Parsed ffprobe output for one file.
///
/// This is what templates see as `.Video`. Field names are kept in ffprobe's
/// snake_case so template authors can cross-check against `ffprobe -of json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeSummary {
    /// Path to the probed file.
    pub file_path: PathBuf,
    /// Container-level information.
    pub format: FormatInfo,
    /// All streams in file order.
    pub streams: Vec<StreamInfo>,
    /// Chapter markers, if any.
    pub chapters: Vec<Chapter>,
    /// Shortcut figures for the primary video stream.
    pub summary: VideoSummary,
}

impl ProbeSummary {
    /// Get the first video stream.
    pub fn primary_video(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| s.codec_type == "video")
    }

    /// Iterate over streams of one type ("video", "audio", "subtitle", ...).
    pub fn streams_of<'a>(&'a self, codec_type: &'a str) -> impl Iterator<Item = &'a StreamInfo> {
        self.streams.iter().filter(move |s| s.codec_type == codec_type)
    }
}

/// Container record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub filename: String,
    pub format_name: String,
    pub format_long_name: Option<String>,
    pub nb_streams: u32,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Size in bytes.
    pub size: Option<u64>,
    /// Overall bit rate in bits per second.
    pub bit_rate: Option<u64>,
    pub tags: BTreeMap<String, String>,
}

/// One stream of any type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub index: u32,
    pub codec_type: String,
    pub codec_name: Option<String>,
    pub codec_long_name: Option<String>,
    pub profile: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub pix_fmt: Option<String>,
    /// Frames per second, from `r_frame_rate`.
    pub frame_rate: Option<f64>,
    pub bit_rate: Option<u64>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    pub channels: Option<u32>,
    pub channel_layout: Option<String>,
    pub sample_rate: Option<u32>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub default: bool,
    pub forced: bool,
    pub tags: BTreeMap<String, String>,
}

/// Chapter marker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: i64,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub title: Option<String>,
}

/// Figures most templates branch on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub codec: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frame_rate: Option<f64>,
    /// Duration in seconds.
    pub duration: Option<f64>,
    /// Bits per second.
    pub bit_rate: Option<u64>,
    /// Megabits per second, two decimals.
    pub bit_rate_mbps: Option<f64>,
}
