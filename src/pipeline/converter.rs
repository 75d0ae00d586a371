use super::error::PipelineError;
use super::report::{LocationOutcome, LocationReport, PassReport, VideoOutcome, VideoReport};
use crate::config::{effective_location, Config, Location, Profile, ProfileRegistry, Settings};
use crate::scanner;
use chrono::Utc;
use framesmith_av::{
    find_template, FfmpegTranscoder, FfprobeProber, ProbeSummary, Prober, RenderedCommand,
    Template, TemplateContext, Transcoder,
};
use framesmith_common::fs::{ensure_dir, move_file, move_new_file};
use framesmith_common::paths::output_file_name;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span, warn};

type Result<T> = std::result::Result<T, PipelineError>;

/// A transcode output waiting in the tmp tree.
#[derive(Debug)]
struct Staged {
    path: PathBuf,
    file_name: String,
}

/// Drives locations through scan, convert, promote or quarantine.
pub struct Converter {
    settings: Settings,
    profiles: ProfileRegistry,
    locations: Vec<Location>,
    prober: Box<dyn Prober>,
    transcoder: Box<dyn Transcoder>,
}

impl Converter {
    /// Build a converter around the given tools.
    pub fn new(config: &Config, prober: Box<dyn Prober>, transcoder: Box<dyn Transcoder>) -> Self {
        Self {
            settings: config.settings.clone(),
            profiles: config.profiles.clone(),
            locations: config.locations.clone(),
            prober,
            transcoder,
        }
    }

    /// Build a converter using the configured ffprobe and ffmpeg binaries.
    ///
    /// Fails when either binary cannot be found.
    pub fn from_config(config: &Config) -> Result<Self> {
        let prober = FfprobeProber::new(&config.settings.ffprobe)?;
        let transcoder = FfmpegTranscoder::new(&config.settings.ffmpeg)?;
        info!(
            ffprobe = %prober.binary().display(),
            ffmpeg = %transcoder.binary().display(),
            "using external tools"
        );
        Ok(Self::new(config, Box::new(prober), Box::new(transcoder)))
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Process every location once, in configuration order.
    ///
    /// Only fatal errors are returned; location and video failures end up in
    /// the report.
    pub fn run_pass(&self) -> Result<PassReport> {
        let started_at = Utc::now();
        let mut locations = Vec::with_capacity(self.locations.len());
        for location in &self.locations {
            locations.push(self.run_location(location)?);
        }
        Ok(PassReport {
            started_at,
            finished_at: Utc::now(),
            locations,
        })
    }

    /// Run passes forever, sleeping `poll_interval` between them.
    ///
    /// `on_pass` sees every report and can stop the loop by returning
    /// [`ControlFlow::Break`].
    pub fn run_daemon<F>(&self, mut on_pass: F) -> Result<()>
    where
        F: FnMut(&PassReport) -> ControlFlow<()>,
    {
        info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            "starting daemon"
        );
        loop {
            let report = self.run_pass()?;
            if on_pass(&report).is_break() {
                return Ok(());
            }
            debug!("sleeping until next pass");
            std::thread::sleep(self.settings.poll_interval);
        }
    }

    /// Process a single location: overlay, scan, then every video in turn.
    pub fn run_location(&self, location: &Location) -> Result<LocationReport> {
        let span = info_span!("location", path = %location.base.display());
        let _enter = span.enter();

        let skipped = |reason: String| {
            warn!(%reason, "skipping location");
            LocationReport {
                path: location.base.clone(),
                outcome: LocationOutcome::Skipped { reason },
            }
        };

        let effective =
            match effective_location(location, &self.profiles, &self.settings.overlay_file) {
                Ok(effective) => effective,
                Err(e) => return Ok(skipped(e.to_string())),
            };

        if !effective.base.is_dir() {
            let e = framesmith_common::Error::scan(&effective.base, "location does not exist");
            return Ok(skipped(e.to_string()));
        }

        for dir in [
            effective.input_dir(),
            effective.output_dir(),
            effective.tmp_dir(),
            effective.fail_dir(),
        ] {
            if let Err(e) = ensure_dir(&dir) {
                return Ok(skipped(e.to_string()));
            }
        }

        let videos = match scanner::scan(&effective.input_dir(), &self.settings.video_extensions) {
            Ok(videos) => videos,
            Err(e) => return Ok(skipped(e.to_string())),
        };
        info!(count = videos.len(), "scanned input");

        let mut reports = Vec::with_capacity(videos.len());
        for relative in videos {
            reports.push(self.process_video(&effective, &relative)?);
        }

        Ok(LocationReport {
            path: location.base.clone(),
            outcome: LocationOutcome::Processed { videos: reports },
        })
    }

    fn process_video(&self, location: &Location, relative: &Path) -> Result<VideoReport> {
        let span = info_span!("video", file = %relative.display());
        let _enter = span.enter();
        info!("processing video");

        let source = location.input_dir().join(relative);
        let outcome = match self.convert(location, &source, relative) {
            Ok(staged) => self.promote(location, &source, relative, &staged),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => self.quarantine(location, &source, relative, e),
        };

        Ok(VideoReport {
            relative_path: relative.to_path_buf(),
            outcome,
        })
    }

    /// Probe once, then run every profile into the tmp tree.
    fn convert(&self, location: &Location, source: &Path, relative: &Path) -> Result<Vec<Staged>> {
        let summary = self.prober.probe(source)?;
        debug!(
            prober = self.prober.name(),
            codec = ?summary.summary.codec,
            width = ?summary.summary.width,
            height = ?summary.summary.height,
            duration = ?summary.summary.duration,
            "probed"
        );

        let tmp_dir = location.tmp_dir().join(parent_of(relative));
        let mut staged = Vec::with_capacity(location.profiles.len());

        for name in &location.profiles {
            let profile = self
                .profiles
                .get(name)
                .ok_or_else(|| PipelineError::Config(format!("unknown profile {name:?}")))?;

            let rendered = render_profile(&self.settings.template_dirs, profile, &summary)?;
            let extension = rendered
                .extension
                .as_deref()
                .or(profile.extension.as_deref())
                .unwrap_or_default();
            let file_name = output_file_name(source, &profile.name, extension);
            let output = tmp_dir.join(&file_name);

            ensure_dir(&tmp_dir)?;
            remove_stale(&output)?;

            let command = self
                .transcoder
                .run(source, &output, &rendered.init, &rendered.args)?;
            debug!(
                profile = %profile.name,
                command = %command.join(" "),
                "transcode finished"
            );

            staged.push(Staged {
                path: output,
                file_name,
            });
        }

        Ok(staged)
    }

    /// Move staged outputs and then the original into the output tree.
    ///
    /// Nothing already in the output tree is replaced: an existing destination
    /// stops promotion before any move. On the first failed move every file
    /// already moved is put back, so the original stays in the input tree and
    /// a later pass retries it.
    fn promote(
        &self,
        location: &Location,
        source: &Path,
        relative: &Path,
        staged: &[Staged],
    ) -> VideoOutcome {
        let dest_dir = location.output_dir().join(parent_of(relative));

        let mut moves: Vec<(PathBuf, PathBuf)> = staged
            .iter()
            .map(|s| (s.path.clone(), dest_dir.join(&s.file_name)))
            .collect();
        moves.push((source.to_path_buf(), location.output_dir().join(relative)));

        if let Some((_, taken)) = moves.iter().find(|(_, to)| to.symlink_metadata().is_ok()) {
            error!(file = %taken.display(), "output already exists, not promoting");
            return VideoOutcome::Inconsistent {
                cause: format!("{} already exists in the output tree", taken.display()),
            };
        }

        let mut done: Vec<(&Path, &Path)> = Vec::with_capacity(moves.len());
        for (from, to) in &moves {
            if let Err(e) = move_new_file(from, to) {
                error!(error = %e, "promotion failed, rolling back");
                for (back_to, back_from) in done.iter().rev() {
                    if let Err(rollback) = move_new_file(back_from, back_to) {
                        error!(
                            file = %back_from.display(),
                            error = %rollback,
                            "rollback failed, file left in output tree"
                        );
                    }
                }
                return VideoOutcome::Inconsistent {
                    cause: e.to_string(),
                };
            }
            done.push((from.as_path(), to.as_path()));
        }

        let outputs: Vec<PathBuf> = moves[..staged.len()]
            .iter()
            .map(|(_, to)| to.clone())
            .collect();
        info!(outputs = outputs.len(), "video promoted");
        VideoOutcome::Promoted { outputs }
    }

    /// Move the original into the fail tree. Staged outputs stay in tmp.
    fn quarantine(
        &self,
        location: &Location,
        source: &Path,
        relative: &Path,
        cause: PipelineError,
    ) -> VideoOutcome {
        if let Some(command) = cause.command() {
            debug!(command = %command.join(" "), "failed command");
        }
        error!(error = %cause, "quarantining video");

        let target = location.fail_dir().join(relative);
        match move_file(source, &target) {
            Ok(()) => VideoOutcome::Quarantined {
                cause: cause.to_string(),
            },
            Err(e) => {
                error!(error = %e, "quarantine move failed, original left in input");
                VideoOutcome::Inconsistent {
                    cause: format!("{cause}; quarantine failed: {e}"),
                }
            }
        }
    }
}

/// Resolve and render a profile's template against a probe summary.
pub fn render_profile<P: AsRef<Path>>(
    template_dirs: &[P],
    profile: &Profile,
    summary: &ProbeSummary,
) -> Result<RenderedCommand> {
    let path = find_template(template_dirs, &profile.template)?;
    let template = Template::from_file(&path)?;
    let data = TemplateContext::new(summary)?
        .with_profile(&profile.params)
        .with_flags(&profile.flags)
        .into_value();
    let rendered = template.render(&data)?;
    debug!(
        profile = %profile.name,
        template = %path.display(),
        init = ?rendered.init,
        args = ?rendered.args,
        "rendered template"
    );
    Ok(rendered)
}

/// Delete a leftover output from an earlier, interrupted run.
fn remove_stale(output: &Path) -> Result<()> {
    if output.exists() {
        warn!(file = %output.display(), "removing stale staged output");
        std::fs::remove_file(output)
            .map_err(|e| framesmith_common::Error::filesystem("remove", output, e))?;
    }
    Ok(())
}

fn parent_of(relative: &Path) -> &Path {
    relative.parent().unwrap_or_else(|| Path::new(""))
}
