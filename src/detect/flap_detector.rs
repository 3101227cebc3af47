//! Flap Detector (§4.6): repeated persistent-down → active oscillations within a
//! scan window.

use crate::detect::rfc3339_utc;
use crate::model::Snapshot;

/// One emitted flap event, pre-annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlapOutcome {
    /// Row to annotate — the `active` snapshot that completed the threshold-breaching
    /// instance.
    pub event_ts: i64,
    /// Start of that instance's down run, embedded in the reason text.
    pub since_ts: i64,
}

impl FlapOutcome {
    /// `"<device> port <n> down since <RFC3339> (and flapped back to active)"` per §4.6.
    #[must_use]
    pub fn reason(&self, device: &str, port: u16) -> String {
        format!(
            "{device} port {port} down since {} (and flapped back to active)",
            rfc3339_utc(self.since_ts)
        )
    }
}

/// Evaluate the flap condition over one `(device, port)`'s time-ordered snapshots.
///
/// Returns the first instance at which the running oscillation count reaches
/// `flap_back_to_active_threshold`; later oscillations in the same window are not
/// examined (at-most-one-per-scan, §4.6 rationale).
pub fn detect(
    snapshots: &[Snapshot],
    flap_down_interval_threshold_secs: i64,
    flap_back_to_active_threshold: u32,
) -> Option<FlapOutcome> {
    let mut down1: Option<&Snapshot> = None;
    let mut down2: Option<&Snapshot> = None;
    let mut instances: u32 = 0;

    for s in snapshots {
        if s.is_active() {
            if let (Some(d1), Some(_)) = (down1, down2) {
                instances += 1;
                if instances >= flap_back_to_active_threshold {
                    return Some(FlapOutcome {
                        event_ts: s.ts,
                        since_ts: d1.ts,
                    });
                }
            }
            down1 = None;
            down2 = None;
        } else {
            match (down1, down2) {
                (None, _) => down1 = Some(s),
                (Some(d1), None) if s.ts - d1.ts >= flap_down_interval_threshold_secs => {
                    down2 = Some(s);
                }
                _ => {}
            }
        }
    }
    None
}
