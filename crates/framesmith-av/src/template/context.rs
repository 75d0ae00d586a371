//! Data context handed to templates.

use crate::flags::FlagSet;
use crate::probe::ProbeSummary;
use crate::Result;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Builder for the value templates render against.
///
/// The top-level keys are fixed: `.Video` (the probe summary), `.Profile`
/// (the profile's parameters), `.Flags` (`init`/`args` tokens from the flag
/// table) and `.Local` (scratch space written by `set`).
///
/// # Example
///
/// ```
/// use framesmith_av::probe::ProbeSummary;
/// use framesmith_av::TemplateContext;
/// use serde_json::json;
///
/// let data = TemplateContext::new(&ProbeSummary::default())?
///     .with_param("codec", json!("libx264"))
///     .into_value();
///
/// assert_eq!(data["Profile"]["codec"], "libx264");
/// assert_eq!(data["Flags"]["args"], json!([]));
/// # Ok::<(), framesmith_av::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TemplateContext {
    video: Value,
    profile: Map<String, Value>,
    flags: FlagSet,
    local: Map<String, Value>,
}

impl TemplateContext {
    /// Start a context from a probe summary.
    pub fn new(video: &ProbeSummary) -> Result<Self> {
        Ok(Self {
            video: serde_json::to_value(video)?,
            profile: Map::new(),
            flags: FlagSet::default(),
            local: Map::new(),
        })
    }

    /// Set all profile parameters.
    pub fn with_profile(mut self, params: &BTreeMap<String, Value>) -> Self {
        self.profile = params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self
    }

    /// Add a single profile parameter.
    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.profile.insert(key.to_string(), value);
        self
    }

    /// Set the flag-table tokens.
    pub fn with_flags(mut self, flags: &FlagSet) -> Self {
        self.flags = flags.clone();
        self
    }

    /// Pre-seed a `.Local` value.
    pub fn with_local(mut self, key: &str, value: Value) -> Self {
        self.local.insert(key.to_string(), value);
        self
    }

    /// Finish into the JSON value the renderer reads.
    pub fn into_value(self) -> Value {
        let mut root = Map::new();
        root.insert("Video".to_string(), self.video);
        root.insert("Profile".to_string(), Value::Object(self.profile));
        root.insert(
            "Flags".to_string(),
            serde_json::json!({ "init": self.flags.init, "args": self.flags.args }),
        );
        root.insert("Local".to_string(), Value::Object(self.local));
        Value::Object(root)
    }
}
