//! Ordered table mapping profile parameters to ffmpeg flags.
//!
//! Each profile's parameters go through [`FlagTable::build`] once, when the
//! configuration loads. The result is a [`FlagSet`] holding the ready-made
//! pre-input (`init`) and post-input (`args`) tokens, which templates splice in
//! via `.Flags.init` / `.Flags.args`. Parameters the table does not know about
//! are ignored here; templates can still read them from `.Profile`.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Which side of `-i <input>` a flag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Init,
    Args,
}

/// How a parameter value is validated and turned into tokens.
#[derive(Debug, Clone, Copy)]
pub enum Formatter {
    /// Boolean switch emitting fixed tokens when true.
    Switch(&'static [&'static str]),
    /// Positive integer after the flag.
    Positive(&'static str),
    /// Integer clamped into a range.
    Clamped(&'static str, i64, i64),
    /// One value from a closed list.
    OneOf(&'static str, &'static [&'static str]),
    /// Seconds rendered as HH:MM:SS; `true` rejects zero.
    Timestamp(&'static str, bool),
    /// Height limit rendered as a scale filter that never upscales.
    Scale,
    /// Free text split on whitespace.
    Split,
}

/// One table row.
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    pub param: &'static str,
    pub placement: Placement,
    pub formatter: Formatter,
}

const CODECS: &[&str] = &["libx264", "libx265", "h264_nvenc", "hevc_nvenc", "copy"];

const PRESETS: &[&str] = &[
    "ultrafast",
    "superfast",
    "veryfast",
    "faster",
    "fast",
    "medium",
    "slow",
    "slower",
    "veryslow",
];

const TUNES: &[&str] = &[
    "film",
    "animation",
    "grain",
    "stillimage",
    "fastdecode",
    "zerolatency",
    "hq",
    "ll",
    "ull",
    "lossless",
];

const STANDARD: &[FlagSpec] = &[
    FlagSpec {
        param: "cuda_decoding",
        placement: Placement::Init,
        formatter: Formatter::Switch(&["-hwaccel", "cuda"]),
    },
    FlagSpec {
        param: "cuda_hw_output",
        placement: Placement::Init,
        formatter: Formatter::Switch(&["-hwaccel_output_format", "cuda"]),
    },
    FlagSpec {
        param: "scale",
        placement: Placement::Args,
        formatter: Formatter::Scale,
    },
    FlagSpec {
        param: "threads",
        placement: Placement::Args,
        formatter: Formatter::Positive("-threads"),
    },
    FlagSpec {
        param: "codec",
        placement: Placement::Args,
        formatter: Formatter::OneOf("-c:v", CODECS),
    },
    FlagSpec {
        param: "quality_crf",
        placement: Placement::Args,
        formatter: Formatter::Clamped("-crf", 0, 51),
    },
    FlagSpec {
        param: "quality_preset",
        placement: Placement::Args,
        formatter: Formatter::OneOf("-preset", PRESETS),
    },
    FlagSpec {
        param: "quality_tune",
        placement: Placement::Args,
        formatter: Formatter::OneOf("-tune", TUNES),
    },
    FlagSpec {
        param: "start",
        placement: Placement::Args,
        formatter: Formatter::Timestamp("-ss", false),
    },
    FlagSpec {
        param: "duration",
        placement: Placement::Args,
        formatter: Formatter::Timestamp("-t", true),
    },
    FlagSpec {
        param: "extra",
        placement: Placement::Args,
        formatter: Formatter::Split,
    },
];

/// Tokens produced from one profile's parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlagSet {
    pub init: Vec<String>,
    pub args: Vec<String>,
}

impl FlagSet {
    pub fn is_empty(&self) -> bool {
        self.init.is_empty() && self.args.is_empty()
    }
}

/// The ordered flag table.
#[derive(Debug, Clone)]
pub struct FlagTable {
    specs: &'static [FlagSpec],
}

impl Default for FlagTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl FlagTable {
    /// The built-in ffmpeg table.
    pub fn standard() -> Self {
        Self { specs: STANDARD }
    }

    pub fn specs(&self) -> &[FlagSpec] {
        self.specs
    }

    /// Validate `params` and produce their tokens, in table order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFlag`] for the first parameter whose value the
    /// table rejects.
    pub fn build(&self, params: &BTreeMap<String, Value>) -> Result<FlagSet> {
        let mut set = FlagSet::default();

        for spec in self.specs {
            let Some(value) = params.get(spec.param) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let tokens = format_value(spec, value)?;
            match spec.placement {
                Placement::Init => set.init.extend(tokens),
                Placement::Args => set.args.extend(tokens),
            }
        }

        Ok(set)
    }
}

fn format_value(spec: &FlagSpec, value: &Value) -> Result<Vec<String>> {
    let param = spec.param;
    let tokens = match spec.formatter {
        Formatter::Switch(tokens) => {
            if as_bool(param, value)? {
                tokens.iter().map(|t| t.to_string()).collect()
            } else {
                Vec::new()
            }
        }
        Formatter::Positive(flag) => {
            let n = as_int(param, value)?;
            if n <= 0 {
                return Err(Error::invalid_flag(param, format!("{n} is not positive")));
            }
            vec![flag.to_string(), n.to_string()]
        }
        Formatter::Clamped(flag, min, max) => {
            let n = as_int(param, value)?.clamp(min, max);
            vec![flag.to_string(), n.to_string()]
        }
        Formatter::OneOf(flag, allowed) => {
            let s = as_str(param, value)?;
            if !allowed.contains(&s) {
                return Err(Error::invalid_flag(
                    param,
                    format!("\"{s}\" is not one of {}", allowed.join(", ")),
                ));
            }
            vec![flag.to_string(), s.to_string()]
        }
        Formatter::Timestamp(flag, nonzero) => {
            let secs = as_int(param, value)?;
            if secs < 0 || (nonzero && secs == 0) {
                return Err(Error::invalid_flag(param, format!("{secs} seconds is out of range")));
            }
            vec![flag.to_string(), format_timestamp(secs as u64)]
        }
        Formatter::Scale => {
            let height = as_int(param, value)?;
            if height <= 0 {
                return Err(Error::invalid_flag(param, format!("{height} is not positive")));
            }
            vec![
                "-vf".to_string(),
                format!("scale=-2:min({height}\\,ih-mod(ih\\,2))"),
            ]
        }
        Formatter::Split => as_str(param, value)?
            .split_whitespace()
            .map(str::to_string)
            .collect(),
    };
    Ok(tokens)
}

/// Render seconds as `HH:MM:SS`.
pub fn format_timestamp(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

fn as_bool(param: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(Error::invalid_flag(param, format!("expected a boolean, got {other}"))),
    }
}

fn as_int(param: &str, value: &Value) -> Result<i64> {
    let n = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.ok_or_else(|| Error::invalid_flag(param, format!("expected an integer, got {value}")))
}

fn as_str<'a>(param: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| Error::invalid_flag(param, format!("expected a string, got {value}")))
}
