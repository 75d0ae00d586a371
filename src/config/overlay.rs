//! Per-location overlay file.
//!
//! A small TOML file inside a location root that can rename the location's
//! subdirectories and change which profiles apply, without touching the main
//! configuration. It is re-read on every pass.

use super::model::{Location, ProfileRegistry};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Overlay {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub tmp: Option<String>,
    #[serde(default)]
    pub fail: Option<String>,
    /// Discard the configured profile list before appending `applied`.
    #[serde(default)]
    pub drop_applied: bool,
    /// Profile names appended to the location's list. Names already applied
    /// are ignored.
    #[serde(default)]
    pub applied: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("overlay {}: {message}", path.display())]
pub struct OverlayError {
    pub path: PathBuf,
    pub message: String,
}

impl Overlay {
    /// Read the overlay for `location`, if the file exists.
    pub fn read(location: &Location, file_name: &str) -> Result<Option<Self>, OverlayError> {
        let path = location.base.join(file_name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(OverlayError {
                    path,
                    message: e.to_string(),
                })
            }
        };

        toml::from_str(&content).map(Some).map_err(|e| OverlayError {
            path,
            message: e.to_string(),
        })
    }

    /// Produce the effective location. `location` itself is left unchanged.
    pub fn apply(
        &self,
        location: &Location,
        registry: &ProfileRegistry,
        path: &Path,
    ) -> Result<Location, OverlayError> {
        let error = |message: String| OverlayError {
            path: path.to_path_buf(),
            message,
        };

        let mut effective = location.clone();
        if let Some(input) = &self.input {
            effective.dirs.input = input.clone();
        }
        if let Some(output) = &self.output {
            effective.dirs.output = output.clone();
        }
        if let Some(tmp) = &self.tmp {
            effective.dirs.tmp = tmp.clone();
        }
        if let Some(fail) = &self.fail {
            effective.dirs.fail = fail.clone();
        }
        effective.dirs.validate().map_err(error)?;

        if self.drop_applied {
            effective.profiles.clear();
        }
        for name in &self.applied {
            if !registry.contains(name) {
                return Err(error(format!("unknown profile {name:?}")));
            }
            if effective.profiles.contains(name) {
                tracing::debug!(profile = %name, "overlay profile already applied");
                continue;
            }
            effective.profiles.push(name.clone());
        }

        Ok(effective)
    }
}

/// Resolve the location to use for this pass.
pub fn effective_location(
    location: &Location,
    registry: &ProfileRegistry,
    file_name: &str,
) -> Result<Location, OverlayError> {
    match Overlay::read(location, file_name)? {
        Some(overlay) => {
            tracing::debug!(base = %location.base.display(), "applying location overlay");
            overlay.apply(location, registry, &location.base.join(file_name))
        }
        None => Ok(location.clone()),
    }
}
