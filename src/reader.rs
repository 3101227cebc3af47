//! Snapshot Reader — returns ordered `(ts, state, total_link_downed)` sequences for
//! one `(device, port)` since a bound (§4.4). Pure: never writes.

use rusqlite::Connection;

use crate::db::history;
use crate::errors::Result;
use crate::model::Snapshot;

/// Read snapshots for `(device, port)` with `ts >= since` (or unbounded when
/// `since == 0`), ascending by `ts`. An empty result is a valid, non-error outcome.
pub(crate) fn snapshots_since(
    conn: &Connection,
    table: &str,
    device: &str,
    port: u16,
    since: i64,
) -> Result<Vec<Snapshot>> {
    history::select_snapshots(conn, table, device, port, since)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::schema::{apply_pragmas, apply_schema};
    use crate::ingest;
    use crate::model::PortObservation;
    use crate::shared_state::SharedState;
    use std::collections::BTreeSet;

    #[test]
    fn empty_log_returns_empty_not_error() {
        let mut conn = Connection::open_in_memory().unwrap();
        let cfg = StoreConfig::default();
        apply_pragmas(&conn).unwrap();
        apply_schema(&mut conn, &cfg).unwrap();
        let rows = snapshots_since(&conn, &cfg.history_table(), "mlx5_0", 1, 0).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn since_filters_older_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        let cfg = StoreConfig::default();
        apply_pragmas(&conn).unwrap();
        apply_schema(&mut conn, &cfg).unwrap();
        let table = cfg.history_table();
        let shared = SharedState::new(0, BTreeSet::new());
        let make = |ts: i64| {
            ingest::insert(
                &mut conn,
                &table,
                &shared,
                0,
                ts,
                &[PortObservation {
                    device: "mlx5_0".into(),
                    port: 1,
                    link_layer: "infiniband".into(),
                    state: "active".into(),
                    physical_state: "linkup".into(),
                    rate_gb_sec: 100,
                    total_link_downed: 0,
                }],
            )
            .unwrap();
        };
        make(100);
        make(200);
        make(300);
        let rows = snapshots_since(&conn, &table, "mlx5_0", 1, 200).unwrap();
        assert_eq!(rows.iter().map(|s| s.ts).collect::<Vec<_>>(), vec![200, 300]);
    }
}
