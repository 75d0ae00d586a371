//! Validated, strongly typed configuration handed to the pipeline.

use framesmith_av::FlagSet;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Global settings.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub log_level: String,
    pub poll_interval: Duration,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub video_extensions: Vec<String>,
    pub template_dirs: Vec<PathBuf>,
    pub overlay_file: String,
}

/// A named transcode configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub name: String,
    pub template: String,
    pub extension: Option<String>,
    pub params: BTreeMap<String, Value>,
    /// Flag-table tokens derived from `params` at load time.
    pub flags: FlagSet,
}

/// Profiles by name, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: Vec<Profile>,
}

impl ProfileRegistry {
    /// Build a registry; names must already be unique.
    pub(crate) fn new(profiles: Vec<Profile>) -> Self {
        Self { profiles }
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.iter()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// Subdirectory names of a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationDirs {
    pub input: String,
    pub output: String,
    pub tmp: String,
    pub fail: String,
}

impl LocationDirs {
    /// Check each name is a plain relative path and that they are distinct.
    pub fn validate(&self) -> Result<(), String> {
        let named = [
            ("input", &self.input),
            ("output", &self.output),
            ("tmp", &self.tmp),
            ("fail", &self.fail),
        ];
        for (role, dir) in named {
            let path = Path::new(dir.as_str());
            if dir.trim().is_empty() {
                return Err(format!("{role} directory name is empty"));
            }
            if !path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
            {
                return Err(format!(
                    "{role} directory {dir:?} must be a relative path without \"..\""
                ));
            }
        }
        for (i, (role_a, a)) in named.iter().enumerate() {
            for (role_b, b) in &named[i + 1..] {
                let na = normalize(Path::new(a.as_str()));
                let nb = normalize(Path::new(b.as_str()));
                if na.starts_with(&nb) || nb.starts_with(&na) {
                    return Err(format!("{role_a} and {role_b} directories overlap"));
                }
            }
        }
        Ok(())
    }
}

/// One watched directory tree.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    /// Absolute root of the tree.
    pub base: PathBuf,
    pub dirs: LocationDirs,
    /// Profile names applied to every video, in order.
    pub profiles: Vec<String>,
}

impl Location {
    pub fn input_dir(&self) -> PathBuf {
        self.base.join(&self.dirs.input)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base.join(&self.dirs.output)
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.base.join(&self.dirs.tmp)
    }

    pub fn fail_dir(&self) -> PathBuf {
        self.base.join(&self.dirs.fail)
    }
}

/// Everything the pipeline needs to run.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub profiles: ProfileRegistry,
    pub locations: Vec<Location>,
    /// File the configuration was read from, if any.
    pub source: Option<PathBuf>,
}

/// Lexically normalise a path: drop `.`, fold `..` into its parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
