//! Transcoder invocation.

use crate::tools::resolve_binary;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Runs one transcode from `input` to `output`.
pub trait Transcoder: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Run the transcode and return the command line that was executed.
    ///
    /// On failure the error carries the command line too, see
    /// [`Error::Transcode`].
    fn run(&self, input: &Path, output: &Path, init: &[String], args: &[String])
        -> Result<Vec<String>>;
}

impl<T: Transcoder + ?Sized> Transcoder for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn run(
        &self,
        input: &Path,
        output: &Path,
        init: &[String],
        args: &[String],
    ) -> Result<Vec<String>> {
        (**self).run(input, output, init, args)
    }
}

/// ffmpeg, driven as a child process.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    /// Create a transcoder for the given ffmpeg binary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] if the binary does not exist.
    pub fn new(binary: impl AsRef<Path>) -> Result<Self> {
        let binary = resolve_binary("ffmpeg", binary.as_ref())?;
        Ok(Self { binary })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Build `[binary, ...init, "-i", input, ...args, output]` with absolute paths.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInvocation`] if input and output are the same file or
    /// the input does not exist.
    pub fn command_line(
        &self,
        input: &Path,
        output: &Path,
        init: &[String],
        args: &[String],
    ) -> Result<Vec<String>> {
        command_line(&self.binary, input, output, init, args)
    }
}

impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn run(
        &self,
        input: &Path,
        output: &Path,
        init: &[String],
        args: &[String],
    ) -> Result<Vec<String>> {
        let command = self.command_line(input, output, init, args)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(command = %command.join(" "), "running ffmpeg");

        let result = Command::new(&command[0])
            .args(&command[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Transcode {
                tool: self.name().to_string(),
                status: format!("cannot start: {e}"),
                summary: None,
                command: command.clone(),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(Error::Transcode {
                tool: self.name().to_string(),
                status: result.status.to_string(),
                summary: last_line(&stderr),
                command,
            });
        }

        Ok(command)
    }
}

/// Build the full transcoder token list.
pub fn command_line(
    binary: &Path,
    input: &Path,
    output: &Path,
    init: &[String],
    args: &[String],
) -> Result<Vec<String>> {
    let input_abs = absolute(input)?;
    let output_abs = absolute(output)?;

    if input_abs == output_abs {
        return Err(Error::InvalidInvocation(
            "input cannot be the same as the output".to_string(),
        ));
    }
    if !input_abs.is_file() {
        return Err(Error::InvalidInvocation(format!(
            "input {} does not exist",
            input_abs.display()
        )));
    }

    let mut command = Vec::with_capacity(init.len() + args.len() + 4);
    command.push(binary.display().to_string());
    command.extend(init.iter().cloned());
    command.push("-i".to_string());
    command.push(input_abs.display().to_string());
    command.extend(args.iter().cloned());
    command.push(output_abs.display().to_string());
    Ok(command)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Last non-empty line of tool output, trimmed.
pub fn last_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .rev()
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use assert_matches::assert_matches;

    #[test]
    fn test_last_line() {
        assert_eq!(
            last_line("frame=1\nError opening output\n\n  \n"),
            Some("Error opening output".to_string())
        );
        assert_eq!(last_line("  only  "), Some("only".to_string()));
        assert_eq!(last_line("\n \n"), None);
    }

    #[test]
    fn test_command_line_layout() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        std::fs::write(&input, b"x").unwrap();
        let output = dir.path().join("tmp/in.p1.mp4");

        let cmd = command_line(
            Path::new("/usr/bin/ffmpeg"),
            &input,
            &output,
            &["-hwaccel".into(), "cuda".into()],
            &["-c:v".into(), "libx264".into()],
        )
        .unwrap();

        assert_eq!(
            cmd,
            vec![
                "/usr/bin/ffmpeg".to_string(),
                "-hwaccel".into(),
                "cuda".into(),
                "-i".into(),
                input.display().to_string(),
                "-c:v".into(),
                "libx264".into(),
                output.display().to_string(),
            ]
        );
    }

    #[test]
    fn test_command_line_resolves_relative_paths() {
        let cmd = command_line(
            Path::new("ffmpeg"),
            Path::new("Cargo.toml"),
            Path::new("target/out.mp4"),
            &[],
            &[],
        )
        .unwrap();
        assert!(Path::new(&cmd[2]).is_absolute());
        assert!(Path::new(&cmd[3]).is_absolute());
    }

    #[test]
    fn test_same_input_and_output_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.avi");
        std::fs::write(&input, b"x").unwrap();

        let err = command_line(Path::new("ffmpeg"), &input, &input, &[], &[]).unwrap_err();
        assert_matches!(err, Error::InvalidInvocation(ref m) if m.contains("same as the output"));
    }

    #[test]
    fn test_missing_input_rejected() {
        let dir = tempdir().unwrap();
        let err = command_line(
            Path::new("ffmpeg"),
            &dir.path().join("nope.avi"),
            &dir.path().join("out.mp4"),
            &[],
            &[],
        )
        .unwrap_err();
        assert_matches!(err, Error::InvalidInvocation(_));
    }
}
