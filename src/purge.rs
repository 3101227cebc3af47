//! Tombstone & Purger (§4.9): operator cutoff plus background retention sweep.

use rusqlite::Connection;

use crate::config::StoreConfig;
use crate::db::{history, metadata};
use crate::errors::Result;

/// `Tombstone(ts)`: set the operator cutoff. Events before `ts` become invisible to
/// `Events`; the purger may delete all rows before `ts` regardless of annotation.
pub(crate) fn tombstone(conn: &Connection, metadata_table: &str, ts: i64) -> Result<()> {
    metadata::set(conn, metadata_table, metadata::TOMBSTONE_TIMESTAMP, ts)
}

/// Run one purge cycle (§4.9 steps 1-3). Returns the number of rows deleted.
pub(crate) fn purge_once(conn: &Connection, cfg: &StoreConfig, now: i64) -> Result<usize> {
    let history_table = cfg.history_table();
    let metadata_table = cfg.metadata_table();

    let tombstone_ts = metadata::get(conn, &metadata_table, metadata::TOMBSTONE_TIMESTAMP)?.unwrap_or(0);

    let deleted = if tombstone_ts != 0 {
        history::delete_before(conn, &history_table, tombstone_ts, false)?
    } else {
        let cutoff = now - cfg.retention_period.as_secs() as i64;
        history::delete_before(conn, &history_table, cutoff, true)?
    };

    if deleted > 0 {
        eprintln!("[IBSTORE-PURGE] deleted {deleted} row(s) (tombstoned={})", tombstone_ts != 0);
    }
    Ok(deleted)
}
