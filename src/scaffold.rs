//! `framesmith init`: write a working sample setup.

use crate::config::{ConfigFile, LocationEntry, ProfileEntry};
use anyhow::{bail, Context, Result};
use framesmith_av::template::TEMPLATE_SUFFIX;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "framesmith.toml";

const COPY_TEMPLATE: &str = r#"{
  "init": [{{ tokens .Flags.init }}],
  "args": [
    "-map", "0",
    {{ tokens .Flags.args }},
    {{- if eq .Profile.codec "copy" }}
    "-c", "copy"
    {{- else }}
    "-c:a", "copy", "-c:s", "copy"
    {{- end }}
  ]
}
"#;

const H264_TEMPLATE: &str = r#"{
  "args": [
    "-map", "0:v:0", "-map", "0:a?",
    {{ tokens .Flags.args }},
    {{- if .Video.summary.height }}{{ if gt .Video.summary.height 1080 }}
    "-vf", "scale=-2:1080",
    {{- end }}{{ end }}
    "-c:a", "{{ default "aac" .Profile.audio_codec }}"
  ],
  "extension": "mp4"
}
"#;

const HEADER: &str = "\
# framesmith configuration
#
# Each location watches <path>/<input> for videos, runs every listed profile
# into <path>/<tmp>, then moves the results and the original to <path>/<output>.
# Videos that fail any profile are moved to <path>/<fail>.

";

/// Files and directories written by [`scaffold`].
#[derive(Debug)]
pub struct Scaffold {
    pub config: PathBuf,
    pub templates: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
}

fn sample_config() -> ConfigFile {
    let copy = ProfileEntry {
        name: "remux".to_string(),
        template: "copy".to_string(),
        extension: Some("mkv".to_string()),
        params: BTreeMap::from([("codec".to_string(), Value::from("copy"))]),
    };
    let h264 = ProfileEntry {
        name: "h264".to_string(),
        template: "h264".to_string(),
        extension: None,
        params: BTreeMap::from([
            ("codec".to_string(), Value::from("libx264")),
            ("quality_crf".to_string(), Value::from(23)),
            ("quality_preset".to_string(), Value::from("medium")),
            ("audio_codec".to_string(), Value::from("aac")),
        ]),
    };

    ConfigFile {
        template_dirs: vec![PathBuf::from("templates")],
        profiles: vec![copy, h264],
        locations: vec![LocationEntry {
            path: PathBuf::from("media"),
            input: "in".to_string(),
            output: "out".to_string(),
            tmp: "tmp".to_string(),
            fail: "fail".to_string(),
            profiles: vec!["remux".to_string()],
        }],
        ..ConfigFile::default()
    }
}

/// Write a sample configuration, templates and location tree under `dir`.
///
/// Refuses to overwrite an existing configuration file. Existing templates
/// are left untouched.
pub fn scaffold(dir: &Path) -> Result<Scaffold> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        bail!("{:?} already exists, not overwriting it", config_path);
    }

    let body = toml::to_string_pretty(&sample_config())
        .context("Failed to serialize sample config")?;

    let templates_dir = dir.join("templates");
    std::fs::create_dir_all(&templates_dir)
        .with_context(|| format!("Failed to create {:?}", templates_dir))?;

    let mut templates = Vec::new();
    for (name, source) in [("copy", COPY_TEMPLATE), ("h264", H264_TEMPLATE)] {
        let path = templates_dir.join(format!("{name}{TEMPLATE_SUFFIX}"));
        if !path.exists() {
            std::fs::write(&path, source)
                .with_context(|| format!("Failed to write template: {:?}", path))?;
        }
        templates.push(path);
    }

    let mut directories = Vec::new();
    for sub in ["in", "out", "tmp", "fail"] {
        let path = dir.join("media").join(sub);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create {:?}", path))?;
        directories.push(path);
    }

    std::fs::write(&config_path, format!("{HEADER}{body}"))
        .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

    Ok(Scaffold {
        config: config_path,
        templates,
        directories,
    })
}
