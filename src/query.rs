//! Event Query — `Events(since)` (§4.10): all annotated rows with `timestamp >=
//! effective_since`, ascending.

use rusqlite::Connection;

use crate::db::{history, metadata};
use crate::errors::Result;
use crate::model::Event;

/// Returns events with `timestamp >= max(since, tombstone_timestamp)`, ascending.
pub(crate) fn events_since(
    ro_conn: &Connection,
    history_table: &str,
    metadata_table: &str,
    since: i64,
) -> Result<Vec<Event>> {
    let tombstone = metadata::get(ro_conn, metadata_table, metadata::TOMBSTONE_TIMESTAMP)?.unwrap_or(0);
    let effective_since = since.max(tombstone);
    history::select_events_since(ro_conn, history_table, effective_since)
}
