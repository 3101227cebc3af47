//! Drop and flap detection state machines (§4.5, §4.6) plus shared reason formatting.

pub mod drop_detector;
pub mod flap_detector;

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a unix-second timestamp as RFC3339 UTC, the form both detectors embed in
/// their `event_reason` text.
pub(crate) fn rfc3339_utc(ts: i64) -> String {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| ts.to_string())
}
