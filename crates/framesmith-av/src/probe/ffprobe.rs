//! FFprobe-based media probing.

use super::types::*;
use super::Prober;
use crate::tools::resolve_binary;
use crate::transcode::last_line;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

// ffprobe prints most numbers as JSON strings ("duration": "60.04") but some
// as numbers ("width": 1920). Everything numeric is read as a raw Value and
// parsed leniently; an unparsable figure is simply absent.

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    chapters: Vec<FfprobeChapter>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    format_name: String,
    format_long_name: Option<String>,
    nb_streams: Option<Value>,
    duration: Option<Value>,
    size: Option<Value>,
    bit_rate: Option<Value>,
    #[serde(default)]
    tags: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    codec_type: String,
    codec_name: Option<String>,
    codec_long_name: Option<String>,
    profile: Option<Value>,
    width: Option<Value>,
    height: Option<Value>,
    pix_fmt: Option<String>,
    r_frame_rate: Option<String>,
    bit_rate: Option<Value>,
    duration: Option<Value>,
    channels: Option<Value>,
    channel_layout: Option<String>,
    sample_rate: Option<Value>,
    #[serde(default)]
    disposition: FfprobeDisposition,
    #[serde(default)]
    tags: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeDisposition {
    #[serde(default)]
    default: u8,
    #[serde(default)]
    forced: u8,
}

#[derive(Debug, Deserialize)]
struct FfprobeChapter {
    #[serde(default)]
    id: i64,
    start_time: Option<Value>,
    end_time: Option<Value>,
    #[serde(default)]
    tags: BTreeMap<String, Value>,
}

/// Prober backed by the ffprobe command line tool.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    binary: PathBuf,
}

impl FfprobeProber {
    /// Create a prober for the given ffprobe binary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] if the binary does not exist.
    pub fn new(binary: impl AsRef<Path>) -> Result<Self> {
        let binary = resolve_binary("ffprobe", binary.as_ref())?;
        Ok(Self { binary })
    }

    /// Path of the ffprobe binary in use.
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Prober for FfprobeProber {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn probe(&self, path: &Path) -> Result<ProbeSummary> {
        let output = Command::new(&self.binary)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                "-show_chapters",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::probe(path, format!("cannot run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match last_line(&stderr) {
                Some(line) => format!("{}: {line}", output.status),
                None => output.status.to_string(),
            };
            return Err(Error::probe(path, message));
        }

        let json_str = String::from_utf8(output.stdout)
            .map_err(|e| Error::probe(path, format!("invalid UTF-8: {e}")))?;

        parse_ffprobe_json(path, &json_str)
    }
}

/// Parse the JSON printed by `ffprobe -print_format json`.
///
/// # Errors
///
/// Returns [`Error::Probe`] if the text is not valid ffprobe JSON.
pub fn parse_ffprobe_json(path: &Path, json: &str) -> Result<ProbeSummary> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::probe(path, format!("invalid ffprobe output: {e}")))?;
    Ok(convert(path, output))
}

fn convert(path: &Path, output: FfprobeOutput) -> ProbeSummary {
    let format = output
        .format
        .map(|f| FormatInfo {
            filename: f.filename,
            format_name: f.format_name,
            format_long_name: f.format_long_name,
            nb_streams: number(&f.nb_streams).unwrap_or(0),
            duration: number(&f.duration),
            size: number(&f.size),
            bit_rate: number(&f.bit_rate),
            tags: string_tags(f.tags),
        })
        .unwrap_or_default();

    let streams: Vec<StreamInfo> = output
        .streams
        .into_iter()
        .map(|s| {
            let tags = string_tags(s.tags);
            StreamInfo {
                index: s.index,
                codec_type: s.codec_type,
                codec_name: s.codec_name,
                codec_long_name: s.codec_long_name,
                profile: s.profile.as_ref().and_then(text),
                width: number(&s.width),
                height: number(&s.height),
                pix_fmt: s.pix_fmt,
                frame_rate: s.r_frame_rate.as_deref().and_then(parse_frame_rate),
                bit_rate: number(&s.bit_rate),
                duration: number(&s.duration),
                channels: number(&s.channels),
                channel_layout: s.channel_layout,
                sample_rate: number(&s.sample_rate),
                language: tags.get("language").cloned(),
                title: tags.get("title").cloned(),
                default: s.disposition.default == 1,
                forced: s.disposition.forced == 1,
                tags,
            }
        })
        .collect();

    let chapters = output
        .chapters
        .into_iter()
        .map(|c| {
            let tags = string_tags(c.tags);
            Chapter {
                id: c.id,
                start_time: number(&c.start_time),
                end_time: number(&c.end_time),
                title: tags.get("title").cloned(),
            }
        })
        .collect();

    let summary = summarize(&format, &streams);

    ProbeSummary {
        file_path: path.to_path_buf(),
        format,
        streams,
        chapters,
        summary,
    }
}

fn summarize(format: &FormatInfo, streams: &[StreamInfo]) -> VideoSummary {
    let video = streams.iter().find(|s| s.codec_type == "video");
    let bit_rate = format.bit_rate.or_else(|| video.and_then(|v| v.bit_rate));

    VideoSummary {
        codec: video.and_then(|v| v.codec_name.clone()),
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        frame_rate: video.and_then(|v| v.frame_rate),
        duration: format.duration.or_else(|| video.and_then(|v| v.duration)),
        bit_rate,
        bit_rate_mbps: bit_rate.map(|b| (b as f64 / 10_000.0).round() / 100.0),
    }
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number<T: FromStr>(value: &Option<Value>) -> Option<T> {
    value.as_ref().and_then(text)?.trim().parse().ok()
}

fn string_tags(tags: BTreeMap<String, Value>) -> BTreeMap<String, String> {
    tags.into_iter()
        .filter_map(|(k, v)| text(&v).map(|v| (k, v)))
        .collect()
}

fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate_str.parse().ok()
}
