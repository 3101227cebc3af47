//! Metadata Store: `(k TEXT PRIMARY KEY, v TEXT)` cells for `last_scan_timestamp` and
//! `tombstone_timestamp`. Values are unix-second integers serialized as decimal text.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::{IbStoreError, Result};

pub const LAST_SCAN_TIMESTAMP: &str = "last_scan_timestamp";
pub const TOMBSTONE_TIMESTAMP: &str = "tombstone_timestamp";

/// Read a metadata cell and parse it as an i64. `None` if the key is absent.
/// A stored-but-unparseable value is a `CorruptMetadata` error — never silently
/// treated as zero (§4.2).
pub fn get(conn: &Connection, table: &str, key: &str) -> Result<Option<i64>> {
    let raw: Option<String> = conn
        .query_row(
            &format!("SELECT v FROM {table} WHERE k = ?1"),
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| IbStoreError::sql("metadata::get", e))?;

    match raw {
        None => Ok(None),
        Some(text) => text.trim().parse::<i64>().map(Some).map_err(|e| {
            IbStoreError::CorruptMetadata {
                key: key.to_string(),
                details: e.to_string(),
            }
        }),
    }
}

/// Write a metadata cell via `INSERT OR REPLACE`.
pub fn set(conn: &Connection, table: &str, key: &str, value: i64) -> Result<()> {
    conn.execute(
        &format!("INSERT OR REPLACE INTO {table} (k, v) VALUES (?1, ?2)"),
        params![key, value.to_string()],
    )
    .map_err(|e| IbStoreError::sql("metadata::set", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::schema::{apply_pragmas, apply_schema};

    fn db() -> (Connection, String) {
        let mut conn = Connection::open_in_memory().unwrap();
        let cfg = StoreConfig::default();
        apply_pragmas(&conn).unwrap();
        apply_schema(&mut conn, &cfg).unwrap();
        (conn, cfg.metadata_table())
    }

    #[test]
    fn absent_key_is_none() {
        let (conn, table) = db();
        assert_eq!(get(&conn, &table, LAST_SCAN_TIMESTAMP).unwrap(), None);
    }

    #[test]
    fn set_then_get_roundtrips() {
        let (conn, table) = db();
        set(&conn, &table, TOMBSTONE_TIMESTAMP, 12345).unwrap();
        assert_eq!(get(&conn, &table, TOMBSTONE_TIMESTAMP).unwrap(), Some(12345));
    }

    #[test]
    fn replace_overwrites() {
        let (conn, table) = db();
        set(&conn, &table, LAST_SCAN_TIMESTAMP, 1).unwrap();
        set(&conn, &table, LAST_SCAN_TIMESTAMP, 2).unwrap();
        assert_eq!(get(&conn, &table, LAST_SCAN_TIMESTAMP).unwrap(), Some(2));
    }

    #[test]
    fn corrupt_value_is_an_error_not_zero() {
        let (conn, table) = db();
        conn.execute(
            &format!("INSERT INTO {table} (k, v) VALUES (?1, ?2)"),
            params![LAST_SCAN_TIMESTAMP, "not-a-number"],
        )
        .unwrap();
        let err = get(&conn, &table, LAST_SCAN_TIMESTAMP).unwrap_err();
        assert!(matches!(err, IbStoreError::CorruptMetadata { .. }));
    }
}
