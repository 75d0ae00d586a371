use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The configuration file as written on disk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Sleep between daemon passes, e.g. "5m" or "1h30m".
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,

    #[serde(default = "framesmith_common::paths::default_video_extensions")]
    pub video_extensions: Vec<String>,

    /// Template search path; later entries win on name collisions.
    #[serde(default = "default_template_dirs")]
    pub template_dirs: Vec<PathBuf>,

    /// Name of the per-location overlay file.
    #[serde(default = "default_overlay_file")]
    pub overlay_file: String,

    #[serde(default)]
    pub profiles: Vec<ProfileEntry>,

    #[serde(default)]
    pub locations: Vec<LocationEntry>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            poll_interval: default_poll_interval(),
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
            video_extensions: framesmith_common::paths::default_video_extensions(),
            template_dirs: default_template_dirs(),
            overlay_file: default_overlay_file(),
            profiles: Vec::new(),
            locations: Vec::new(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> String {
    "5m".to_string()
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("/usr/bin/ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("/usr/bin/ffprobe")
}

fn default_template_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("templates")]
}

pub(crate) fn default_overlay_file() -> String {
    ".framesmith.toml".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileEntry {
    pub name: String,

    /// Template name, looked up as `<template>.tmpl.json`.
    pub template: String,

    /// Output extension used when the template does not set one.
    #[serde(default)]
    pub extension: Option<String>,

    /// Free-form parameters, visible to templates as `.Profile`.
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocationEntry {
    /// Location root; relative paths resolve against the config file's directory.
    pub path: PathBuf,

    #[serde(default = "default_input")]
    pub input: String,

    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_tmp")]
    pub tmp: String,

    #[serde(default = "default_fail")]
    pub fail: String,

    /// Profile names applied to every video, in order.
    #[serde(default)]
    pub profiles: Vec<String>,
}

pub(crate) fn default_input() -> String {
    "in".to_string()
}

pub(crate) fn default_output() -> String {
    "out".to_string()
}

pub(crate) fn default_tmp() -> String {
    "tmp".to_string()
}

pub(crate) fn default_fail() -> String {
    "fail".to_string()
}
