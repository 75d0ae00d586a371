use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "framesmith")]
#[command(author, version, about = "Profile-driven batch video transcoding")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert every video in the configured locations
    Run {
        /// Keep running, polling the locations at the configured interval
        #[arg(long)]
        daemon: bool,
    },

    /// Write a sample configuration, templates and location tree
    Init {
        /// Directory to initialise
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Probe a video and show the template data or a rendered command
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Render this template
        #[arg(long)]
        template: Option<String>,

        /// Render this profile (its template unless --template is given)
        #[arg(long)]
        profile: Option<String>,
    },

    /// Check that the configured ffmpeg and ffprobe are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
