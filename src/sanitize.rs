//! Metric-name sanitization for the header emission path.
//!
//! `Server-Timing` embeds the metric name in a structured header value, so
//! names are restricted to letters, digits and underscore before they leave
//! the process. Log lines keep the caller's name verbatim.

use once_cell::sync::Lazy;
use regex::Regex;

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());

/// Reduce `name` to the `[A-Za-z0-9_]` character set.
///
/// Runs of disallowed characters collapse to a single `_`, and leading or
/// trailing underscores introduced by the replacement are trimmed, so
/// `"my metric!"` becomes `"my_metric"`.
pub fn sanitize_metric_name(name: &str) -> String {
    DISALLOWED
        .replace_all(name, "_")
        .trim_matches('_')
        .to_string()
}
