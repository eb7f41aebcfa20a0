//! Duration parsing utilities.

use anyhow::Context;
use std::time::Duration;

/// Unit suffixes with their length in milliseconds. `ms` precedes `m` and `s`
/// so it is matched first.
const UNITS: [(&str, u64); 4] = [("ms", 1), ("h", 3_600_000), ("m", 60_000), ("s", 1_000)];

/// Parse a duration string like "500ms", "5s", "2m", "1h" or "5".
///
/// A number without a suffix is taken as seconds.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (num_str, unit_millis) = UNITS
        .iter()
        .find_map(|(suffix, millis)| s.strip_suffix(suffix).map(|rest| (rest, *millis)))
        .unwrap_or((s, 1_000));

    let value: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid duration value: {s}"))?;
    let millis = value
        .checked_mul(unit_millis)
        .with_context(|| format!("Duration out of range: {s}"))?;
    Ok(Duration::from_millis(millis))
}
