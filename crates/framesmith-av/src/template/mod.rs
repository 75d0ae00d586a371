//! Argument templates.
//!
//! A template is a text file that renders to a small JSON object:
//!
//! ```text
//! {
//!   "init": [{{ tokens .Flags.init }}],
//!   "args": ["-c:v", "libx264", {{ tokens .Flags.args }}],
//!   "extension": "mp4"
//! }
//! ```
//!
//! Newlines are collapsed to spaces before parsing, so templates can be
//! written over several lines. Directives:
//!
//! - `{{ .Path }}` substitutes a scalar field, JSON-escaped
//! - `{{ default "x" .Path }}` substitutes with a fallback for missing fields
//! - `{{ tokens .Path }}` splices a string list into a JSON array
//! - `{{ set "key" VALUE }}` stores a value under `.Local`
//! - `{{ if COND }}`, `{{ else if COND }}`, `{{ else }}`, `{{ end }}`
//!
//! Conditions are a field or literal (truthiness), `not C`, `and A B`,
//! `or A B`, or `eq|ne|lt|le|gt|ge A B`. `{{-` and `-}}` trim surrounding
//! whitespace. Rendering produces a [`RenderedCommand`].

mod context;
mod exec;
mod parse;

pub use context::TemplateContext;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// File name suffix of template files.
pub const TEMPLATE_SUFFIX: &str = ".tmpl.json";

/// Rendered transcoder arguments for one (video, profile) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedCommand {
    /// Arguments placed before `-i <input>`.
    #[serde(default)]
    pub init: Vec<String>,
    /// Arguments placed after the input.
    #[serde(default)]
    pub args: Vec<String>,
    /// Output container extension override, without dots.
    #[serde(default)]
    pub extension: Option<String>,
}

/// A parsed template.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<parse::Node>,
}

impl Template {
    /// Parse template source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateParse`] if the source is malformed.
    pub fn parse(source: &str) -> Result<Self> {
        let collapsed = source.replace(['\r', '\n'], " ");
        Ok(Self {
            nodes: parse::parse(&collapsed)?,
        })
    }

    /// Read and parse a template file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Render to text without decoding. Useful for debugging templates.
    pub fn render_text(&self, data: &Value) -> Result<String> {
        let mut data = data.clone();
        exec::execute(&self.nodes, &mut data)
    }

    /// Render and decode into a [`RenderedCommand`].
    ///
    /// # Errors
    ///
    /// [`Error::TemplateExec`] if a directive fails, [`Error::TemplateDecode`]
    /// if the output is not the expected JSON object.
    pub fn render(&self, data: &Value) -> Result<RenderedCommand> {
        let text = self.render_text(data)?;
        decode(&text)
    }
}

/// Parse and render template source in one step.
pub fn render(source: &str, data: &Value) -> Result<RenderedCommand> {
    Template::parse(source)?.render(data)
}

fn decode(text: &str) -> Result<RenderedCommand> {
    let mut command: RenderedCommand =
        serde_json::from_str(text).map_err(|e| Error::TemplateDecode(e.to_string()))?;

    command.init.retain(|t| !t.trim().is_empty());
    command.args.retain(|t| !t.trim().is_empty());
    command.extension = command
        .extension
        .map(|e| e.trim().trim_matches('.').trim().to_string())
        .filter(|e| !e.is_empty());

    Ok(command)
}

/// Locate `<name>.tmpl.json` across `dirs`.
///
/// Directories are searched in order and the last match wins, so later
/// directories override earlier ones. Directories that do not exist are
/// skipped.
///
/// # Errors
///
/// [`Error::TemplateNotFound`] if no directory holds the template,
/// [`Error::Io`] if a directory exists but cannot be listed.
pub fn find_template<P: AsRef<Path>>(dirs: &[P], name: &str) -> Result<PathBuf> {
    let file_name = format!("{name}{TEMPLATE_SUFFIX}");
    let mut found = None;

    for dir in dirs {
        let dir = dir.as_ref();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(Error::Io(e)),
        };

        for entry in entries {
            let entry = entry?;
            if entry.file_name().to_str() == Some(file_name.as_str()) && !entry.file_type()?.is_dir()
            {
                found = Some(dir.join(&file_name));
            }
        }
    }

    found.ok_or_else(|| Error::TemplateNotFound {
        name: name.to_string(),
    })
}
