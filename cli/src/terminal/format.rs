use std::time::Duration;

use burrow_common::plugin::Finding;
use colored::*;

use crate::terminal::colors;

/// `1.42s`, `2m05s` or `1h03m00s`, whichever is shortest.
pub fn elapsed(duration: Duration) -> String {
    let secs = duration.as_secs();
    match secs {
        0..60 => format!("{:.2}s", duration.as_secs_f64()),
        60..3600 => format!("{}m{:02}s", secs / 60, secs % 60),
        _ => format!("{}h{:02}m{:02}s", secs / 3600, (secs % 3600) / 60, secs % 60),
    }
}

pub fn finding(finding: &Finding) -> String {
    let subject = finding.subject.color(colors::FINDING).bold();
    if finding.details.is_empty() {
        return format!("Found: {subject}");
    }
    let details = finding.details.join(",").color(colors::DETAIL);
    format!("Found: {subject} {}{details}{}", "[".color(colors::SEPARATOR), "]".color(colors::SEPARATOR))
}
