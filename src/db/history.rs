//! History Log reads/writes — the single source of truth for port observations.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{IbStoreError, Result};
use crate::model::{Event, IbPort, PortKey, PortObservation, Snapshot};

/// Insert every observation in `obs` as one row sharing `timestamp`, in a single
/// transaction. On any failure the whole batch rolls back (§4.3 atomicity).
///
/// Callers must have already filtered to `link_layer == "infiniband"` and normalized
/// (trim + lowercase) `device`/`state`/`physical_state`/`link_layer` — this function
/// persists rows as given.
pub fn insert_batch(
    conn: &mut Connection,
    table: &str,
    timestamp: i64,
    obs: &[PortObservation],
) -> Result<()> {
    let tx = conn.transaction().map_err(|e| IbStoreError::Transaction {
        context: "insert_batch",
        details: e.to_string(),
    })?;
    {
        let mut stmt = tx
            .prepare_cached(&format!(
                "INSERT INTO {table} (
                    timestamp, device, port, link_layer, state, physical_state,
                    rate_gb_sec, total_link_downed, event_type
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,'')"
            ))
            .map_err(|e| IbStoreError::sql("insert_batch:prepare", e))?;
        for o in obs {
            stmt.execute(params![
                timestamp,
                o.device,
                o.port,
                o.link_layer,
                o.state,
                o.physical_state,
                o.rate_gb_sec,
                o.total_link_downed as i64,
            ])
            .map_err(|e| IbStoreError::sql("insert_batch:execute", e))?;
        }
    }
    tx.commit().map_err(|e| IbStoreError::Transaction {
        context: "insert_batch:commit",
        details: e.to_string(),
    })?;
    Ok(())
}

/// Read `(ts, state, total_link_downed)` snapshots for `(device, port)` in ascending
/// `ts` order, filtered by `ts >= since` when `since` is non-zero.
pub fn select_snapshots(
    conn: &Connection,
    table: &str,
    device: &str,
    port: u16,
    since: i64,
) -> Result<Vec<Snapshot>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT timestamp, state, total_link_downed FROM {table}
             WHERE device = ?1 AND port = ?2 AND timestamp >= ?3
             ORDER BY timestamp ASC"
        ))
        .map_err(|e| IbStoreError::sql("select_snapshots:prepare", e))?;
    let rows = stmt
        .query_map(params![device, port, since], |row| {
            Ok(Snapshot {
                ts: row.get(0)?,
                state: row.get(1)?,
                total_link_downed: {
                    let v: i64 = row.get(2)?;
                    v as u64
                },
            })
        })
        .map_err(|e| IbStoreError::sql("select_snapshots:query", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| IbStoreError::sql("select_snapshots:collect", e))?;
    Ok(rows)
}

/// All distinct `(device, port)` pairs ever observed — used to rebuild the in-memory
/// device/port sets on startup (§3.2 invariant 5).
pub fn distinct_port_keys(conn: &Connection, table: &str) -> Result<Vec<PortKey>> {
    let mut stmt = conn
        .prepare(&format!("SELECT DISTINCT device, port FROM {table}"))
        .map_err(|e| IbStoreError::sql("distinct_port_keys:prepare", e))?;
    let rows = stmt
        .query_map([], |row| {
            Ok(PortKey {
                device: row.get(0)?,
                port: row.get(1)?,
            })
        })
        .map_err(|e| IbStoreError::sql("distinct_port_keys:query", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| IbStoreError::sql("distinct_port_keys:collect", e))?;
    Ok(rows)
}

/// Most recent `timestamp` in the log, used to initialize `last_inserted_timestamp`
/// on startup. `None` if the log is empty.
pub fn max_timestamp(conn: &Connection, table: &str) -> Result<Option<i64>> {
    conn.query_row(&format!("SELECT MAX(timestamp) FROM {table}"), [], |row| {
        row.get::<_, Option<i64>>(0)
    })
    .map_err(|e| IbStoreError::sql("max_timestamp", e))
}

/// Set `event_type`/`event_reason` on the row matching `(timestamp, device, port)`.
/// Returns the number of rows affected (0 means the target row is gone, e.g. purged
/// concurrently — the caller treats that as a warning, not an error).
pub fn set_event_type(
    conn: &Connection,
    table: &str,
    device: &str,
    port: u16,
    timestamp: i64,
    event_type: &str,
    event_reason: &str,
) -> Result<usize> {
    let affected = conn
        .execute(
            &format!(
                "UPDATE {table} SET event_type = ?1, event_reason = ?2
                 WHERE timestamp = ?3 AND device = ?4 AND port = ?5"
            ),
            params![event_type, event_reason, timestamp, device, port],
        )
        .map_err(|e| IbStoreError::sql("set_event_type", e))?;
    Ok(affected)
}

/// Rows with non-empty `event_type` and `timestamp >= effective_since`, ascending by
/// `timestamp`.
pub fn select_events_since(
    conn: &Connection,
    table: &str,
    effective_since: i64,
) -> Result<Vec<Event>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT timestamp, device, port, link_layer, state, physical_state,
                    rate_gb_sec, total_link_downed, event_type, event_reason
             FROM {table}
             WHERE event_type != '' AND timestamp >= ?1
             ORDER BY timestamp ASC"
        ))
        .map_err(|e| IbStoreError::sql("select_events_since:prepare", e))?;
    let rows = stmt
        .query_map(params![effective_since], |row| {
            Ok(Event {
                time: row.get(0)?,
                port: IbPort {
                    device: row.get(1)?,
                    port: row.get(2)?,
                    link_layer: row.get(3)?,
                    state: row.get(4)?,
                    physical_state: row.get(5)?,
                    rate_gb_sec: row.get(6)?,
                    total_link_downed: {
                        let v: i64 = row.get(7)?;
                        v as u64
                    },
                },
                event_type: row.get(8)?,
                event_reason: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
            })
        })
        .map_err(|e| IbStoreError::sql("select_events_since:query", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| IbStoreError::sql("select_events_since:collect", e))?;
    Ok(rows)
}

/// Delete rows with `timestamp < cutoff`. When `only_unannotated` is true, rows with
/// a non-empty `event_type` are preserved (absent-tombstone retention policy); when
/// false, every row below the cutoff is deleted unconditionally (tombstoned purge).
pub fn delete_before(
    conn: &Connection,
    table: &str,
    cutoff: i64,
    only_unannotated: bool,
) -> Result<usize> {
    let sql = if only_unannotated {
        format!("DELETE FROM {table} WHERE timestamp < ?1 AND event_type = ''")
    } else {
        format!("DELETE FROM {table} WHERE timestamp < ?1")
    };
    conn.execute(&sql, params![cutoff])
        .map_err(|e| IbStoreError::sql("delete_before", e))
}

/// Whether a given row identity still exists. Exposed for tests verifying
/// event-row preservation and tombstone purge behavior.
#[cfg(test)]
pub fn row_exists(conn: &Connection, table: &str, timestamp: i64, device: &str, port: u16) -> Result<bool> {
    let exists: Option<i64> = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE timestamp = ?1 AND device = ?2 AND port = ?3"),
            params![timestamp, device, port],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| IbStoreError::sql("row_exists", e))?;
    Ok(exists.is_some())
}
