//! Background purger task lifecycle: spawned at construction when `purge_interval >
//! 0`, terminates on root cancellation. A single long-lived worker rather than a
//! respawn-on-panic fleet — a panic here cannot corrupt the log since every write is
//! transactional, so there is nothing for a supervisor to repair beyond "don't let
//! the process die".

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Mutex, RwLock};
use rusqlite::Connection;

use crate::cancel::CancelToken;
use crate::config::StoreConfig;
use crate::deadline;
use crate::purge;
use crate::time::now_unix;

/// Spawn the purger thread. Returns `None` immediately (no thread spawned) if
/// `purge_interval` is zero at construction time — §9 design note (c).
pub(crate) fn spawn(
    rw: Arc<Mutex<Connection>>,
    cfg: Arc<RwLock<StoreConfig>>,
    cancel: CancelToken,
) -> Option<JoinHandle<()>> {
    if cfg.read().purge_interval.is_zero() {
        return None;
    }

    Some(thread::spawn(move || {
        loop {
            let interval = cfg.read().purge_interval;
            if interval.is_zero() || !cancel.sleep(interval) {
                break;
            }

            let snapshot = cfg.read().clone();
            let now = now_unix();
            let conn = rw.lock();
            let watch = deadline::install(&conn, &cancel, snapshot.purge_deadline);
            let result = purge::purge_once(&conn, &snapshot, now);
            let result = deadline::finish(&conn, watch, "purge", snapshot.purge_deadline, result);
            if let Err(err) = result {
                // §7 propagation policy: the purger logs and continues on transient
                // errors; it never terminates itself except on root cancellation.
                eprintln!("[IBSTORE-PURGE] cycle failed, will retry next interval: {err}");
            }
        }
        eprintln!("[IBSTORE-PURGE] purger thread exiting on cancellation");
    }))
}
