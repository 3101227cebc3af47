//! Drop Detector (§4.5): a port continuously non-active, with no link-down-counter
//! movement, for at least `drop_persistence_threshold`.

use crate::detect::rfc3339_utc;
use crate::model::Snapshot;

/// One emitted drop event, pre-annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropOutcome {
    /// Row to annotate — the latest snapshot of the qualifying down run.
    pub event_ts: i64,
    /// Start of the down run, embedded in the reason text.
    pub since_ts: i64,
}

impl DropOutcome {
    /// `"<device> port <n> down since <RFC3339>"` per §4.5.
    #[must_use]
    pub fn reason(&self, device: &str, port: u16) -> String {
        format!("{device} port {port} down since {}", rfc3339_utc(self.since_ts))
    }
}

/// Evaluate the drop condition over one `(device, port)`'s time-ordered snapshots.
///
/// Only the contiguous down run still open at the end of `snapshots` is considered —
/// any earlier down run broken by an `active` snapshot is reset and not re-examined.
pub fn detect(snapshots: &[Snapshot], drop_persistence_threshold_secs: i64) -> Option<DropOutcome> {
    if snapshots.len() < 2 {
        return None;
    }

    let mut down_oldest: Option<&Snapshot> = None;
    let mut down_latest: Option<&Snapshot> = None;
    for s in snapshots {
        if s.is_active() {
            down_oldest = None;
            down_latest = None;
        } else {
            if down_oldest.is_none() {
                down_oldest = Some(s);
            }
            down_latest = Some(s);
        }
    }

    let oldest = down_oldest?;
    let latest = down_latest?;

    if oldest.total_link_downed == latest.total_link_downed
        && latest.ts - oldest.ts >= drop_persistence_threshold_secs
    {
        Some(DropOutcome {
            event_ts: latest.ts,
            since_ts: oldest.ts,
        })
    } else {
        None
    }
}
