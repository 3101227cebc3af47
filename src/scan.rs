//! Scanner — `Scan()` (§4.8): orchestrates detectors across all known `(device, port)`
//! pairs for a bounded scan window, advancing `last_scan_timestamp` only on full
//! success.

use rusqlite::Connection;

use crate::annotate;
use crate::config::StoreConfig;
use crate::db::metadata;
use crate::detect::{drop_detector, flap_detector};
use crate::errors::Result;
use crate::model::event_type;
use crate::reader;
use crate::shared_state::SharedState;

/// Run one scan pass. `now` is the wall-clock instant to record as the new
/// `last_scan_timestamp` on success.
pub(crate) fn run(
    rw_conn: &Connection,
    ro_conn: &Connection,
    cfg: &StoreConfig,
    shared: &SharedState,
    now: i64,
) -> Result<()> {
    let history_table = cfg.history_table();
    let metadata_table = cfg.metadata_table();

    let last_scan = metadata::get(ro_conn, &metadata_table, metadata::LAST_SCAN_TIMESTAMP)?.unwrap_or(0);
    let tombstone = metadata::get(ro_conn, &metadata_table, metadata::TOMBSTONE_TIMESTAMP)?.unwrap_or(0);
    let since = last_scan.max(tombstone);

    let drop_since = if since == 0 { 0 } else { since - cfg.drop_lookback_period.as_secs() as i64 };
    let flap_since = if since == 0 { 0 } else { since - cfg.flap_lookback_period.as_secs() as i64 };
    let drop_threshold = cfg.drop_persistence_threshold.as_secs() as i64;
    let flap_threshold = cfg.flap_down_interval_threshold.as_secs() as i64;

    for key in shared.known_ports() {
        let drop_snapshots = reader::snapshots_since(ro_conn, &history_table, &key.device, key.port, drop_since)?;
        if let Some(outcome) = drop_detector::detect(&drop_snapshots, drop_threshold) {
            let reason = outcome.reason(&key.device, key.port);
            annotate::set_event_type(
                rw_conn,
                &history_table,
                &key.device,
                key.port,
                outcome.event_ts,
                event_type::DROP,
                &reason,
            )?;
        }

        let flap_snapshots = reader::snapshots_since(ro_conn, &history_table, &key.device, key.port, flap_since)?;
        if let Some(outcome) =
            flap_detector::detect(&flap_snapshots, flap_threshold, cfg.flap_back_to_active_threshold)
        {
            let reason = outcome.reason(&key.device, key.port);
            annotate::set_event_type(
                rw_conn,
                &history_table,
                &key.device,
                key.port,
                outcome.event_ts,
                event_type::FLAP,
                &reason,
            )?;
        }
    }

    metadata::set(rw_conn, &metadata_table, metadata::LAST_SCAN_TIMESTAMP, now)?;
    eprintln!("[IBSTORE-SCAN] completed scan at now={now}, since={since}, ports={}", shared.known_ports().len());
    Ok(())
}
