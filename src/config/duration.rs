//! Poll interval parsing ("90s", "5m", "1h30m").

use anyhow::{bail, Result};
use regex::Regex;
use std::time::Duration;

/// Parse an `<n>h<n>m<n>s` duration. At least one component is required and
/// the total must be non-zero.
pub fn parse_duration(text: &str) -> Result<Duration> {
    let text = text.trim();
    let pattern = Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$")?;
    let Some(caps) = pattern.captures(text) else {
        bail!("invalid duration {text:?}, expected something like \"5m\" or \"1h30m\"");
    };

    let mut secs = 0u64;
    for (index, unit) in [(1, 3600u64), (2, 60), (3, 1)] {
        if let Some(m) = caps.get(index) {
            let n: u64 = m.as_str().parse()?;
            secs = secs.saturating_add(n.saturating_mul(unit));
        }
    }

    if secs == 0 {
        bail!("duration {text:?} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
