//! Probe integration tests
//!
//! Runs the ffprobe-backed prober against scripted stand-ins.

mod common;

use assert_matches::assert_matches;
use framesmith_av::{Error, FfprobeProber, Prober};
use std::path::Path;
use tempfile::tempdir;

#[test]
fn test_missing_binary() {
    let err = FfprobeProber::new("/nonexistent/bin/ffprobe").unwrap_err();
    assert_matches!(err, Error::ToolNotFound { ref tool } if tool == "ffprobe");
    assert!(err.is_config_error());
}

#[cfg(unix)]
mod scripted {
    use super::*;
    use crate::common::{fake_tools, touch, write_script};

    #[test]
    fn test_probe_parses_output() {
        let dir = tempdir().unwrap();
        let tools = fake_tools(dir.path(), false);
        let video = touch(dir.path(), "in/video.avi", "x");

        let prober = FfprobeProber::new(&tools.ffprobe).unwrap();
        let summary = prober.probe(&video).unwrap();

        assert_eq!(summary.file_path, video);
        assert_eq!(summary.format.format_name, "avi");
        assert_eq!(summary.format.duration, Some(60.0));
        assert_eq!(summary.streams.len(), 2);
        assert_eq!(summary.summary.codec.as_deref(), Some("h264"));
        assert_eq!(summary.summary.height, Some(1080));
        assert_eq!(summary.summary.frame_rate, Some(25.0));
        assert_eq!(summary.summary.bit_rate_mbps, Some(5.0));
        assert_eq!(
            summary.streams_of("audio").next().unwrap().language.as_deref(),
            Some("eng")
        );

        // Asked for everything in JSON
        let args = std::fs::read_to_string(tools.dir.join("probe.log")).unwrap();
        assert!(args.contains("-print_format json -show_format -show_streams -show_chapters"));
        assert!(args.trim_end().ends_with(&video.display().to_string()));
    }

    #[test]
    fn test_probe_failure_reports_last_line() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("ffprobe");
        write_script(
            &script,
            "echo 'something' >&2\necho 'video.avi: Invalid data found when processing input' >&2\nexit 1",
        );

        let prober = FfprobeProber::new(&script).unwrap();
        let err = prober.probe(Path::new("video.avi")).unwrap_err();
        assert_matches!(
            &err,
            Error::Probe { message, .. } if message.ends_with("Invalid data found when processing input")
        );
    }

    #[test]
    fn test_probe_garbage_output() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("ffprobe");
        write_script(&script, "echo 'not json'");

        let prober = FfprobeProber::new(&script).unwrap();
        assert_matches!(
            prober.probe(Path::new("video.avi")),
            Err(Error::Probe { .. })
        );
    }
}
