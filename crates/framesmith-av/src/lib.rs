//! # framesmith-av
//!
//! Media-facing half of framesmith.
//!
//! This crate provides functionality for:
//! - Probing media files with ffprobe into a typed [`ProbeSummary`]
//! - Rendering argument templates against probe data and profile parameters
//! - Turning profile parameters into ffmpeg flags through a fixed table
//! - Invoking ffmpeg and summarising its failures
//!
//! ## Features
//!
//! - `tracing` - Emit debug events for executed commands
//!
//! ## Example
//!
//! ```no_run
//! use framesmith_av::{find_template, FfprobeProber, Prober, Template, TemplateContext};
//! use std::path::Path;
//!
//! let prober = FfprobeProber::new("/usr/bin/ffprobe")?;
//! let video = prober.probe(Path::new("/media/in/clip.mkv"))?;
//!
//! let path = find_template(&["/etc/framesmith/templates"], "x264")?;
//! let data = TemplateContext::new(&video)?.into_value();
//! let rendered = Template::from_file(&path)?.render(&data)?;
//! println!("ffmpeg args: {:?}", rendered.args);
//! # Ok::<(), framesmith_av::Error>(())
//! ```

mod error;
pub mod flags;
pub mod probe;
pub mod template;
pub mod tools;
pub mod transcode;

// Re-exports
pub use error::{Error, Result};
pub use flags::{FlagSet, FlagTable};
pub use probe::{FfprobeProber, ProbeSummary, Prober};
pub use template::{find_template, RenderedCommand, Template, TemplateContext};
pub use tools::{check_tool, resolve_binary, ToolInfo};
pub use transcode::{FfmpegTranscoder, Transcoder};
