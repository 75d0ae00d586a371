mod duration;
mod model;
pub mod overlay;
mod types;

pub use duration::parse_duration;
pub use model::*;
pub use overlay::{effective_location, Overlay, OverlayError};
pub use types::*;

use anyhow::{bail, Context, Result};
use framesmith_av::{find_template, FlagTable};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Load configuration from a TOML file.
///
/// Relative paths inside the file resolve against the file's directory.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let base_dir = std::path::absolute(&base_dir)
        .with_context(|| format!("Failed to resolve {:?}", base_dir))?;

    let mut config = resolve_config(file, &base_dir)
        .with_context(|| format!("Invalid config file: {:?}", path))?;
    config.source = Some(path.to_path_buf());
    Ok(config)
}

const DEFAULT_PATHS: [&str; 3] = [
    "./framesmith.toml",
    "~/.config/framesmith/config.toml",
    "/etc/framesmith/config.toml",
];

/// First default config location that exists.
pub fn find_config_file() -> Option<PathBuf> {
    DEFAULT_PATHS
        .iter()
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
        .find(|p| p.exists())
}

/// Load config from the given path or the first default location that exists.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    match find_config_file() {
        Some(path) => load_config(&path),
        None => bail!(
            "No configuration file found (looked in {}). Create one with `framesmith init`",
            DEFAULT_PATHS.join(", ")
        ),
    }
}

/// Validate a parsed file and turn it into the typed configuration.
pub fn resolve_config(file: ConfigFile, base_dir: &Path) -> Result<Config> {
    let log_level = file.log_level.trim().to_lowercase();
    if !LOG_LEVELS.contains(&log_level.as_str()) {
        bail!(
            "log_level {:?} is not one of {}",
            file.log_level,
            LOG_LEVELS.join(", ")
        );
    }

    let poll_interval = parse_duration(&file.poll_interval).context("Invalid poll_interval")?;

    let video_extensions: Vec<String> = file
        .video_extensions
        .iter()
        .map(|e| framesmith_common::paths::normalize_extension(e))
        .filter(|e| !e.is_empty())
        .collect();
    if video_extensions.is_empty() {
        bail!("video_extensions must list at least one extension");
    }

    if file.overlay_file.trim().is_empty() || file.overlay_file.contains(['/', '\\']) {
        bail!("overlay_file {:?} must be a plain file name", file.overlay_file);
    }

    let settings = Settings {
        log_level,
        poll_interval,
        ffmpeg: expand_binary(&file.ffmpeg, base_dir),
        ffprobe: expand_binary(&file.ffprobe, base_dir),
        video_extensions,
        template_dirs: file
            .template_dirs
            .iter()
            .map(|d| expand_path(d, base_dir))
            .collect(),
        overlay_file: file.overlay_file,
    };

    let profiles = resolve_profiles(file.profiles, &settings.template_dirs)?;
    let locations = resolve_locations(file.locations, &profiles, base_dir)?;

    Ok(Config {
        settings,
        profiles,
        locations,
        source: None,
    })
}

fn resolve_profiles(
    entries: Vec<ProfileEntry>,
    template_dirs: &[PathBuf],
) -> Result<ProfileRegistry> {
    let table = FlagTable::standard();
    let mut seen = HashSet::new();
    let mut profiles = Vec::with_capacity(entries.len());

    for entry in entries {
        let name = entry.name.trim().to_string();
        if name.is_empty() {
            bail!("Profile name cannot be empty");
        }
        if name.contains(['/', '\\']) {
            bail!("Profile name {name:?} cannot contain path separators");
        }
        if !seen.insert(name.clone()) {
            bail!("Duplicate profile name {name:?}");
        }

        let template = entry.template.trim().to_string();
        if template.is_empty() {
            bail!("Profile {name:?} has no template");
        }
        find_template(template_dirs, &template)
            .with_context(|| format!("Profile {name:?} references a missing template"))?;

        let flags = table
            .build(&entry.params)
            .with_context(|| format!("Profile {name:?} has invalid parameters"))?;

        profiles.push(Profile {
            name,
            template,
            extension: entry
                .extension
                .map(|e| e.trim().trim_matches('.').to_string())
                .filter(|e| !e.is_empty()),
            params: entry.params,
            flags,
        });
    }

    Ok(ProfileRegistry::new(profiles))
}

fn resolve_locations(
    entries: Vec<LocationEntry>,
    profiles: &ProfileRegistry,
    base_dir: &Path,
) -> Result<Vec<Location>> {
    let mut locations: Vec<Location> = Vec::with_capacity(entries.len());

    for entry in entries {
        let base = normalize(&expand_path(&entry.path, base_dir));
        let dirs = LocationDirs {
            input: entry.input,
            output: entry.output,
            tmp: entry.tmp,
            fail: entry.fail,
        };
        if let Err(msg) = dirs.validate() {
            bail!("Location {:?}: {msg}", entry.path);
        }

        let mut applied = HashSet::new();
        for name in &entry.profiles {
            if !profiles.contains(name) {
                bail!("Location {:?} applies unknown profile {name:?}", entry.path);
            }
            if !applied.insert(name.as_str()) {
                bail!("Location {:?} applies profile {name:?} more than once", entry.path);
            }
        }

        if let Some(other) = locations
            .iter()
            .find(|l| l.base.starts_with(&base) || base.starts_with(&l.base))
        {
            bail!(
                "Locations {:?} and {:?} overlap",
                other.base,
                base
            );
        }

        locations.push(Location {
            base,
            dirs,
            profiles: entry.profiles,
        });
    }

    Ok(locations)
}

/// Expand `~` and resolve relative paths against `base_dir`.
fn expand_path(path: &Path, base_dir: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let expanded = PathBuf::from(expanded);
    if expanded.is_absolute() {
        expanded
    } else {
        base_dir.join(expanded)
    }
}

/// Binaries given as a bare name stay bare so they are looked up on `PATH`.
fn expand_binary(path: &Path, base_dir: &Path) -> PathBuf {
    if path.components().count() <= 1 {
        return path.to_path_buf();
    }
    expand_path(path, base_dir)
}
