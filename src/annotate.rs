//! Event Annotator — `SetEventType(device, port, ts, event_type, event_reason)` (§4.7).

use rusqlite::Connection;

use crate::db::history;
use crate::errors::Result;

/// Annotate exactly the row matching `(timestamp, device, port)`. A target row that
/// no longer exists (e.g. purged concurrently) is logged as a warning, not an error.
pub(crate) fn set_event_type(
    conn: &Connection,
    table: &str,
    device: &str,
    port: u16,
    timestamp: i64,
    event_type: &str,
    event_reason: &str,
) -> Result<()> {
    let affected = history::set_event_type(conn, table, device, port, timestamp, event_type, event_reason)?;
    if affected == 0 {
        eprintln!(
            "[IBSTORE-ANNOTATE] WARNING: no row matched ({device}, {port}, ts={timestamp}) for {event_type}"
        );
    }
    Ok(())
}
