//! End-to-end scenarios against the public `Store` API, backed by a tempfile SQLite
//! database rather than the in-memory connections the unit tests use.

use ibstore::{CancelToken, PortObservation, Store, StoreConfig, event_type};
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;

fn store_with(cfg: StoreConfig) -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ib_history.db");
    let rw = Connection::open(&path).unwrap();
    let ro = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
    let store = Store::with_config(CancelToken::new(), rw, ro, cfg).unwrap();
    (dir, store)
}

fn quiet(cfg_mut: impl FnOnce(&mut StoreConfig)) -> StoreConfig {
    let mut cfg = StoreConfig::default();
    cfg.purge_interval = Duration::ZERO;
    cfg.min_insert_interval = Duration::ZERO;
    cfg_mut(&mut cfg);
    cfg
}

fn ib(device: &str, state: &str, downed: u64) -> PortObservation {
    PortObservation {
        device: device.to_string(),
        port: 1,
        link_layer: "InfiniBand".to_string(),
        state: state.to_string(),
        physical_state: "LinkUp".to_string(),
        rate_gb_sec: 100,
        total_link_downed: downed,
    }
}

#[test]
fn monotonic_counter_reboot_tolerance() {
    // §9: a driver reload resets total_link_downed to zero mid-run. The drop window
    // open at the reset point no longer satisfies the equality condition, so no event
    // fires for it; a later sustained-down window with a fresh stable counter does.
    let (_dir, store) = store_with(quiet(|_| {}));

    for i in 0..5i64 {
        store.insert(i * 60, &[ib("mlx5_0", "Down", 5)]).unwrap();
    }
    // Reboot: counter resets to 0, breaking the equality test across the whole run.
    store.insert(300, &[ib("mlx5_0", "Down", 0)]).unwrap();
    store.scan().unwrap();
    assert!(store.events(0).unwrap().is_empty());

    // Fresh stable window after the reset.
    for i in 6..12i64 {
        store.insert(i * 60, &[ib("mlx5_0", "Down", 0)]).unwrap();
    }
    store.scan().unwrap();
    let events = store.events(0).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, event_type::DROP);
    assert_eq!(events[0].time, 660);
}

#[test]
fn scan_iterates_purged_ports_without_error() {
    // §9: known_ports never shrinks, so Scan still visits ports whose history has
    // been fully purged — an empty snapshot read is a valid outcome, not an error.
    let (_dir, store) = store_with(quiet(|cfg| cfg.retention_period = Duration::from_secs(1)));

    store.insert(0, &[ib("mlx5_0", "Active", 0)]).unwrap();
    store.tombstone(1_000_000).unwrap();
    store.purge_now().unwrap();

    assert!(store.scan().is_ok());
    assert!(store.events(0).unwrap().is_empty());
}

#[test]
fn tombstone_then_fresh_insert_is_still_observable() {
    let (_dir, store) = store_with(quiet(|_| {}));
    store.insert(100, &[ib("mlx5_0", "Down", 5)]).unwrap();
    store.set_event_type("mlx5_0", 1, 100, event_type::DROP, "operator note").unwrap();
    store.tombstone(500).unwrap();

    for i in 0..6i64 {
        store.insert(600 + i * 60, &[ib("mlx5_0", "Down", 9)]).unwrap();
    }
    store.scan().unwrap();

    let events = store.events(0).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].time, 900);
}

#[test]
fn reopening_the_store_rebuilds_watermark_and_known_ports_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ib_history.db");

    {
        let rw = Connection::open(&path).unwrap();
        let ro = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
        let store = Store::with_config(CancelToken::new(), rw, ro, quiet(|_| {})).unwrap();
        for i in 0..6i64 {
            store.insert(i * 60, &[ib("mlx5_0", "Down", 5)]).unwrap();
        }
        store.shutdown();
    }

    let rw = Connection::open(&path).unwrap();
    let ro = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
    let store = Store::with_config(CancelToken::new(), rw, ro, quiet(|_| {})).unwrap();
    store.scan().unwrap();
    let events = store.events(0).unwrap();
    assert_eq!(events.len(), 1, "known_ports/watermark must survive a restart");
    assert_eq!(events[0].time, 300);
}

#[test]
fn malformed_metadata_cell_surfaces_as_an_init_error_not_a_silent_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ib_history.db");
    {
        let rw = Connection::open(&path).unwrap();
        let ro = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
        let cfg = StoreConfig::default();
        let store = Store::with_config(CancelToken::new(), rw, ro, cfg.clone()).unwrap();
        store.shutdown();
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            &format!("UPDATE {} SET v = 'not-a-number' WHERE k = 'tombstone_timestamp'", cfg.metadata_table()),
            [],
        )
        .unwrap_or(0);
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (k, v) VALUES ('tombstone_timestamp', 'not-a-number')",
                cfg.metadata_table()
            ),
            [],
        )
        .unwrap();
    }

    let rw = Connection::open(&path).unwrap();
    let ro = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY).unwrap();
    let result = Store::with_config(CancelToken::new(), rw, ro, StoreConfig::default());
    assert!(result.is_err());
}
