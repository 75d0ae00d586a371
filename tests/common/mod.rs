//! Shared helpers for integration tests.
//!
//! External tools are stood in for by small `/bin/sh` scripts so the tests
//! run without ffmpeg installed.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// What the fake ffprobe prints.
pub const FFPROBE_JSON: &str = r#"{
    "streams": [
        {
            "index": 0,
            "codec_name": "h264",
            "codec_type": "video",
            "width": 1920,
            "height": 1080,
            "r_frame_rate": "25/1",
            "bit_rate": "5000000"
        },
        {
            "index": 1,
            "codec_name": "ac3",
            "codec_type": "audio",
            "channels": 6,
            "tags": { "language": "eng" }
        }
    ],
    "format": {
        "filename": "video.avi",
        "nb_streams": 2,
        "format_name": "avi",
        "duration": "60.000000",
        "size": "37500000",
        "bit_rate": "5000000"
    }
}"#;

/// Paths to the fake tools of one test.
pub struct Tools {
    pub dir: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Tools {
    /// How many times ffprobe ran.
    pub fn probe_count(&self) -> usize {
        std::fs::read_to_string(self.dir.join("probe.log"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    /// Argument lines ffmpeg was called with, one per run.
    pub fn ffmpeg_runs(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.join("ffmpeg.log"))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Fake ffmpeg writes its arguments into the output file. With `failing`
/// it prints a couple of stderr lines and exits 1 instead.
#[cfg(unix)]
pub fn fake_tools(dir: &Path, failing: bool) -> Tools {
    let dir = dir.join("bin");
    std::fs::create_dir_all(&dir).unwrap();

    let ffprobe = dir.join("ffprobe");
    write_script(
        &ffprobe,
        &format!(
            "echo \"$@\" >> '{log}'\ncat <<'JSON'\n{FFPROBE_JSON}\nJSON",
            log = dir.join("probe.log").display()
        ),
    );

    let ffmpeg = dir.join("ffmpeg");
    let body = if failing {
        format!(
            "echo \"$@\" >> '{log}'\necho 'Input #0, avi' >&2\necho '  Conversion failed!  ' >&2\necho >&2\nexit 1",
            log = dir.join("ffmpeg.log").display()
        )
    } else {
        format!(
            "echo \"$@\" >> '{log}'\nfor last; do :; done\necho \"$@\" > \"$last\"",
            log = dir.join("ffmpeg.log").display()
        )
    };
    write_script(&ffmpeg, &body);

    Tools {
        dir,
        ffmpeg,
        ffprobe,
    }
}

/// Write a template file into `dir`.
pub fn write_template(dir: &Path, name: &str, source: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(format!("{name}.tmpl.json")), source).unwrap();
}

/// Write `framesmith.toml` into `root` with the given tools and extra TOML.
pub fn write_config(root: &Path, tools: &Tools, extra: &str) -> PathBuf {
    let path = root.join("framesmith.toml");
    std::fs::write(
        &path,
        format!(
            "ffmpeg = '{}'\nffprobe = '{}'\n{extra}",
            tools.ffmpeg.display(),
            tools.ffprobe.display()
        ),
    )
    .unwrap();
    path
}

/// Create a file under `root`, including parent directories.
pub fn touch(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// File names directly inside `dir`, sorted. Missing directories are empty.
pub fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
