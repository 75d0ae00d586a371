//! Pipeline integration tests
//!
//! Full passes over real directory trees, with shell scripts standing in for
//! ffmpeg and ffprobe.

#![cfg(unix)]

mod common;

use common::{fake_tools, list, touch, write_config, write_template, Tools};
use framesmith::config::load_config;
use framesmith::pipeline::{Converter, LocationOutcome, PassReport, VideoOutcome};
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

const X264: &str = r#"{"args": ["-c:v", "libx264"], "extension": "mp4"}"#;

struct Setup {
    root: TempDir,
    tools: Tools,
    config: PathBuf,
}

impl Setup {
    /// One location at `media` with the profiles in `profiles_toml`.
    fn new(failing: bool, profiles_toml: &str, applied: &[&str]) -> Self {
        let root = tempdir().unwrap();
        let tools = fake_tools(root.path(), failing);
        let templates = root.path().join("templates");
        write_template(&templates, "x264", X264);
        write_template(&templates, "plain", r#"{"args": ["-c", "copy"]}"#);
        write_template(
            &templates,
            "needs_lang",
            r#"{"args": ["-metadata", "lang={{ .Profile.lang }}"]}"#,
        );
        write_template(
            &templates,
            "by_height",
            r#"{"args": [{{ if ge .Video.summary.height 1080 }}"-vf", "scale=-2:720"{{ else }}"-c:v", "copy"{{ end }}]}"#,
        );
        std::fs::create_dir_all(root.path().join("media/in")).unwrap();

        let applied = applied
            .iter()
            .map(|p| format!("\"{p}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let config = write_config(
            root.path(),
            &tools,
            &format!("{profiles_toml}\n[[locations]]\npath = \"media\"\nprofiles = [{applied}]\n"),
        );

        Self {
            root,
            tools,
            config,
        }
    }

    fn media(&self) -> PathBuf {
        self.root.path().join("media")
    }

    fn run(&self) -> PassReport {
        let config = load_config(&self.config).unwrap();
        Converter::from_config(&config).unwrap().run_pass().unwrap()
    }
}

const P1: &str = "[[profiles]]\nname = \"p1\"\ntemplate = \"x264\"\n";

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_single_profile_promotes_video() {
    let setup = Setup::new(false, P1, &["p1"]);
    touch(&setup.media(), "in/video1.avi", "original");

    let report = setup.run();
    assert_eq!(report.promoted(), 1);

    assert_eq!(
        list(&setup.media().join("out")),
        vec!["video1.avi", "video1.p1.mp4"]
    );
    assert!(list(&setup.media().join("in")).is_empty());
    assert!(list(&setup.media().join("tmp")).is_empty());
    assert_eq!(read(&setup.media().join("out/video1.avi")), "original");

    let produced = read(&setup.media().join("out/video1.p1.mp4"));
    assert!(produced.contains("-c:v libx264"));
    assert!(produced.contains("video1.avi"));
}

#[test]
fn test_failed_transcode_quarantines_video() {
    let setup = Setup::new(true, P1, &["p1"]);
    touch(&setup.media(), "in/video1.avi", "original");

    let report = setup.run();
    assert_eq!(report.quarantined(), 1);
    let videos = report.locations[0].videos();
    match &videos[0].outcome {
        VideoOutcome::Quarantined { cause } => assert!(cause.contains("Conversion failed!")),
        other => panic!("expected quarantine, got {other:?}"),
    }

    assert_eq!(list(&setup.media().join("fail")), vec!["video1.avi"]);
    assert!(list(&setup.media().join("in")).is_empty());
    assert!(list(&setup.media().join("out")).is_empty());
    assert!(list(&setup.media().join("tmp")).is_empty());
}

#[test]
fn test_stale_staged_output_is_replaced() {
    let setup = Setup::new(false, P1, &["p1"]);
    touch(&setup.media(), "in/video.avi", "original");
    touch(&setup.media(), "tmp/video.p1.mp4", "stale bytes");

    setup.run();

    let promoted = read(&setup.media().join("out/video.p1.mp4"));
    assert!(!promoted.contains("stale"));
    assert!(promoted.contains("-c:v libx264"));
    assert!(list(&setup.media().join("tmp")).is_empty());
    assert_eq!(setup.tools.ffmpeg_runs().len(), 1);
}

#[test]
fn test_probe_runs_once_per_video() {
    let profiles = format!(
        "{P1}[[profiles]]\nname = \"p2\"\ntemplate = \"plain\"\n[[profiles]]\nname = \"p3\"\ntemplate = \"by_height\"\nextension = \"mkv\"\n"
    );
    let setup = Setup::new(false, &profiles, &["p1", "p2", "p3"]);
    touch(&setup.media(), "in/a.avi", "a");
    touch(&setup.media(), "in/b.avi", "b");

    let report = setup.run();
    assert_eq!(report.promoted(), 2);
    assert_eq!(setup.tools.probe_count(), 2);
    assert_eq!(setup.tools.ffmpeg_runs().len(), 6);

    // p1: template override, p2: source extension, p3: profile extension
    assert_eq!(
        list(&setup.media().join("out")),
        vec![
            "a.avi", "a.p1.mp4", "a.p2.avi", "a.p3.mkv", "b.avi", "b.p1.mp4", "b.p2.avi",
            "b.p3.mkv"
        ]
    );
    assert!(read(&setup.media().join("out/a.p3.mkv")).contains("scale=-2:720"));
}

#[test]
fn test_any_profile_failure_keeps_output_tree_clean() {
    // p2's template reads .Profile.lang, which p2 does not set
    let profiles = format!("{P1}[[profiles]]\nname = \"p2\"\ntemplate = \"needs_lang\"\n");
    let setup = Setup::new(false, &profiles, &["p1", "p2"]);
    touch(&setup.media(), "in/show/s01/e01.avi", "e01");

    let report = setup.run();
    assert_eq!(report.quarantined(), 1);

    assert!(setup.media().join("fail/show/s01/e01.avi").is_file());
    assert!(list(&setup.media().join("out")).is_empty());
    // p1's output is left for inspection
    assert!(setup.media().join("tmp/show/s01/e01.p1.mp4").is_file());
}

#[test]
fn test_subdirectories_are_mirrored() {
    let setup = Setup::new(false, P1, &["p1"]);
    touch(&setup.media(), "in/Show/Season 1/ep1.avi", "1");
    touch(&setup.media(), "in/Show/Season 1/notes.txt", "skip me");
    touch(&setup.media(), "in/Movie.MKV", "m");

    let report = setup.run();
    assert_eq!(report.promoted(), 2);

    let season = setup.media().join("out/Show/Season 1");
    assert_eq!(list(&season), vec!["ep1.avi", "ep1.p1.mp4"]);
    assert_eq!(
        list(&setup.media().join("out")),
        vec!["Movie.MKV", "Movie.p1.mp4", "Show"]
    );
    assert!(setup.media().join("in/Show/Season 1/notes.txt").is_file());
}

#[test]
fn test_overlay_changes_profiles_and_dirs() {
    let profiles = format!("{P1}[[profiles]]\nname = \"p2\"\ntemplate = \"plain\"\n");
    let setup = Setup::new(false, &profiles, &["p1"]);
    touch(
        &setup.media(),
        ".framesmith.toml",
        "output = \"done\"\ndrop_applied = true\napplied = [\"p2\"]\n",
    );
    touch(&setup.media(), "in/clip.avi", "c");

    let report = setup.run();
    assert_eq!(report.promoted(), 1);
    assert_eq!(
        list(&setup.media().join("done")),
        vec!["clip.avi", "clip.p2.avi"]
    );
    assert!(!setup.media().join("out").exists());
}

#[test]
fn test_missing_location_is_skipped_and_others_run() {
    let root = tempdir().unwrap();
    let tools = fake_tools(root.path(), false);
    write_template(&root.path().join("templates"), "x264", X264);
    touch(root.path(), "second/in/v.avi", "v");
    let config = write_config(
        root.path(),
        &tools,
        &format!(
            "{P1}[[locations]]\npath = \"first\"\nprofiles = [\"p1\"]\n[[locations]]\npath = \"second\"\nprofiles = [\"p1\"]\n"
        ),
    );

    let config = load_config(&config).unwrap();
    let report = Converter::from_config(&config).unwrap().run_pass().unwrap();

    assert_eq!(report.locations.len(), 2);
    assert!(matches!(
        report.locations[0].outcome,
        LocationOutcome::Skipped { .. }
    ));
    assert_eq!(report.promoted(), 1);
    assert!(root.path().join("second/out/v.p1.mp4").is_file());
}

#[test]
fn test_missing_binary_is_fatal() {
    let setup = Setup::new(false, P1, &["p1"]);
    std::fs::remove_file(&setup.tools.ffmpeg).unwrap();

    let config = load_config(&setup.config).unwrap();
    let err = Converter::from_config(&config).err().unwrap();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("ffmpeg"));
}
