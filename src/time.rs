//! Wall-clock helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as unix seconds. A clock set before the epoch yields `0`
/// rather than panicking, matching the teacher's own tolerance of this exact failure
/// (`cli/bootstrap.rs`'s `unwrap_or_default()` on the same computation).
pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
