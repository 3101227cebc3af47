//! Pragma application and idempotent schema creation.

use rusqlite::Connection;

use crate::config::StoreConfig;
use crate::errors::{IbStoreError, Result};

/// Apply WAL-mode and related pragmas. Safe to call on both the read-write and the
/// read-only handle.
pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;
         PRAGMA foreign_keys = ON;",
    )?;
    let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        eprintln!("[IBSTORE-DB] WARNING: requested WAL mode but got '{mode}'");
    }
    Ok(())
}

/// Create the History Log and Metadata Store tables (plus indexes) if absent, inside
/// a single transaction so a partial failure leaves no half-created schema behind.
pub fn apply_schema(conn: &mut Connection, cfg: &StoreConfig) -> Result<()> {
    let history = cfg.history_table();
    let metadata = cfg.metadata_table();

    let tx = conn.transaction().map_err(|e| IbStoreError::SchemaInit {
        details: e.to_string(),
    })?;

    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {history} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp INTEGER NOT NULL,
            device TEXT NOT NULL,
            port INTEGER NOT NULL,
            link_layer TEXT NOT NULL,
            state TEXT NOT NULL,
            physical_state TEXT NOT NULL,
            rate_gb_sec INTEGER NOT NULL,
            total_link_downed INTEGER NOT NULL,
            event_type TEXT NOT NULL DEFAULT '',
            event_reason TEXT,
            extra_info TEXT
        );

        CREATE TABLE IF NOT EXISTS {metadata} (
            k TEXT PRIMARY KEY,
            v TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_{history}_timestamp ON {history}(timestamp);
        CREATE INDEX IF NOT EXISTS idx_{history}_device ON {history}(device);
        CREATE INDEX IF NOT EXISTS idx_{history}_port ON {history}(port);
        CREATE INDEX IF NOT EXISTS idx_{history}_event_type ON {history}(event_type);
        CREATE INDEX IF NOT EXISTS idx_{history}_state ON {history}(state);
        CREATE INDEX IF NOT EXISTS idx_{history}_device_port ON {history}(device, port, timestamp);"
    ))
    .map_err(|e| IbStoreError::SchemaInit {
        details: e.to_string(),
    })?;

    tx.commit().map_err(|e| IbStoreError::SchemaInit {
        details: e.to_string(),
    })?;
    Ok(())
}
