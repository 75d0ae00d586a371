mod cli;

use framesmith::{
    config::{self, Config, Profile},
    pipeline::{self, Converter},
    scaffold,
};
use framesmith_av::{check_tool, FfprobeProber, FlagSet, Prober, TemplateContext};
use framesmith_common::paths::output_file_name;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { daemon } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            init_logging(cli.verbose, &config.settings.log_level);
            run(&config, daemon)
        }
        Commands::Init { dir } => {
            init_logging(cli.verbose, "info");
            init(&dir)
        }
        Commands::Probe {
            file,
            template,
            profile,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            init_logging(cli.verbose, &config.settings.log_level);
            probe_file(&config, &file, template.as_deref(), profile.as_deref())
        }
        Commands::CheckTools => {
            init_logging(cli.verbose, "info");
            check_tools(cli.config.as_deref())
        }
        Commands::Validate {
            config: config_path,
        } => {
            init_logging(cli.verbose, "info");
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("framesmith {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Install the global subscriber once.
///
/// `RUST_LOG` wins, then `--verbose`, then the configured level.
fn init_logging(verbose: bool, level: &str) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { level };
        format!("warn,framesmith={level},framesmith_av={level},framesmith_common={level}")
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: &Config, daemon: bool) -> Result<()> {
    let converter = Converter::from_config(config)?;
    if converter.locations().is_empty() {
        tracing::warn!("No locations configured, nothing to do");
    }

    if daemon {
        converter.run_daemon(|report| {
            println!("{}", report.summary());
            ControlFlow::Continue(())
        })?;
    } else {
        let report = converter.run_pass()?;
        println!("{}", report.summary());
    }

    Ok(())
}

fn init(dir: &Path) -> Result<()> {
    let written = scaffold::scaffold(dir)?;

    println!("Created {}", written.config.display());
    for template in &written.templates {
        println!("  template  {}", template.display());
    }
    for directory in &written.directories {
        println!("  directory {}", directory.display());
    }
    println!("\nDrop videos into media/in and run `framesmith run`.");

    Ok(())
}

fn probe_file(
    config: &Config,
    file: &Path,
    template: Option<&str>,
    profile: Option<&str>,
) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }

    let prober = FfprobeProber::new(&config.settings.ffprobe)?;
    let summary = prober.probe(file)?;

    if template.is_none() && profile.is_none() {
        let data = TemplateContext::new(&summary)?.into_value();
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    let mut selected = match profile {
        Some(name) => config
            .profiles
            .get(name)
            .cloned()
            .with_context(|| format!("Unknown profile {name:?}"))?,
        None => Profile {
            name: "probe".to_string(),
            template: String::new(),
            extension: None,
            params: BTreeMap::new(),
            flags: FlagSet::default(),
        },
    };
    if let Some(template) = template {
        selected.template = template.to_string();
    }

    let rendered = pipeline::render_profile(&config.settings.template_dirs, &selected, &summary)?;
    let extension = rendered
        .extension
        .as_deref()
        .or(selected.extension.as_deref())
        .unwrap_or_default();
    let output = file.with_file_name(output_file_name(file, &selected.name, extension));
    let command = framesmith_av::transcode::command_line(
        &config.settings.ffmpeg,
        file,
        &output,
        &rendered.init,
        &rendered.args,
    )?;

    let shown = serde_json::json!({
        "init": rendered.init,
        "args": rendered.args,
        "extension": rendered.extension,
        "command": command,
    });
    println!("{}", serde_json::to_string_pretty(&shown)?);

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let (ffmpeg, ffprobe) = match config_path
        .map(Path::to_path_buf)
        .or_else(config::find_config_file)
    {
        Some(path) => {
            let config = config::load_config(&path)?;
            (config.settings.ffmpeg, config.settings.ffprobe)
        }
        None => {
            println!("No configuration found, checking default tool paths");
            let defaults = config::ConfigFile::default();
            (defaults.ffmpeg, defaults.ffprobe)
        }
    };

    println!("Checking external tools...\n");

    let tools = [check_tool("ffmpeg", &ffmpeg), check_tool("ffprobe", &ffprobe)];
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them or fix the paths in the config.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(path)?;

    if let Some(source) = &config.source {
        println!("Validating config: {:?}", source);
    }
    println!("✓ Configuration is valid");
    println!("  Poll interval: {}s", config.settings.poll_interval.as_secs());
    println!("  ffmpeg: {}", config.settings.ffmpeg.display());
    println!("  ffprobe: {}", config.settings.ffprobe.display());
    println!(
        "  Video extensions: {}",
        config.settings.video_extensions.join(", ")
    );
    if config.profiles.is_empty() {
        println!("  Profiles: none");
    } else {
        println!("  Profiles: {}", config.profiles.len());
    }
    for profile in config.profiles.iter() {
        let flags = if profile.flags.is_empty() {
            "(no flags)".to_string()
        } else {
            profile
                .flags
                .init
                .iter()
                .chain(&profile.flags.args)
                .cloned()
                .collect::<Vec<_>>()
                .join(" ")
        };
        println!(
            "    {} (template {}, extension {}) {}",
            profile.name,
            profile.template,
            profile.extension.as_deref().unwrap_or("from source"),
            flags
        );
    }
    println!("  Locations: {}", config.locations.len());
    for location in &config.locations {
        println!(
            "    {} [{}] profiles: {}",
            location.base.display(),
            [
                location.dirs.input.as_str(),
                location.dirs.output.as_str(),
                location.dirs.tmp.as_str(),
                location.dirs.fail.as_str(),
            ]
            .join("/"),
            location.profiles.join(", ")
        );
    }

    Ok(())
}
