//! `Store`: the engine's public surface, wiring History Log, Metadata Store,
//! Ingestor, Snapshot Reader, detectors, Annotator, Scanner, Tombstone & Purger, and
//! Event Query together behind one handle.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Mutex, RwLock};
use rusqlite::Connection;

use crate::cancel::CancelToken;
use crate::config::StoreConfig;
use crate::db::history;
use crate::db::metadata;
use crate::db::schema;
use crate::deadline;
use crate::errors::Result;
use crate::ingest;
use crate::model::{Event, PortObservation, normalize};
use crate::purge;
use crate::purger_thread;
use crate::query;
use crate::scan;
use crate::shared_state::SharedState;
use crate::time::now_unix;

/// The InfiniBand Port History & Event Engine.
///
/// Construct with a root [`CancelToken`], a read-write [`Connection`], and a
/// read-only `Connection` to the same database file (§6). Dropping the `Store`
/// cancels the background purger and joins its thread.
pub struct Store {
    cfg: Arc<RwLock<StoreConfig>>,
    rw: Arc<Mutex<Connection>>,
    ro: Arc<Mutex<Connection>>,
    shared: Arc<SharedState>,
    cancel: CancelToken,
    purger: Option<JoinHandle<()>>,
}

impl Store {
    /// Construct a store with default configuration (§6 defaults table).
    pub fn new(cancel: CancelToken, rw_conn: Connection, ro_conn: Connection) -> Result<Self> {
        Self::with_config(cancel, rw_conn, ro_conn, StoreConfig::default())
    }

    /// Construct a store with an explicit configuration.
    pub fn with_config(
        cancel: CancelToken,
        mut rw_conn: Connection,
        ro_conn: Connection,
        cfg: StoreConfig,
    ) -> Result<Self> {
        schema::apply_pragmas(&rw_conn)?;
        schema::apply_pragmas(&ro_conn)?;
        schema::apply_schema(&mut rw_conn, &cfg)?;

        let history_table = cfg.history_table();
        let metadata_table = cfg.metadata_table();

        // Validate persisted watermarks eagerly so a corrupt cell surfaces as an
        // initialization error rather than failing later mid-scan (§6 constructor
        // contract: "malformed persisted watermark").
        metadata::get(&rw_conn, &metadata_table, metadata::LAST_SCAN_TIMESTAMP)?;
        metadata::get(&rw_conn, &metadata_table, metadata::TOMBSTONE_TIMESTAMP)?;

        let last_inserted = history::max_timestamp(&rw_conn, &history_table)?.unwrap_or(0);
        let known_ports: BTreeSet<_> = history::distinct_port_keys(&rw_conn, &history_table)?
            .into_iter()
            .collect();

        let shared = Arc::new(SharedState::new(last_inserted, known_ports));
        let cfg = Arc::new(RwLock::new(cfg));
        let rw = Arc::new(Mutex::new(rw_conn));
        let ro = Arc::new(Mutex::new(ro_conn));

        let purger = purger_thread::spawn(Arc::clone(&rw), Arc::clone(&cfg), cancel.clone());

        Ok(Self {
            cfg,
            rw,
            ro,
            shared,
            cancel,
            purger,
        })
    }

    /// `Insert(event_time, ports)` (§4.3). Bounded by `query_deadline` (§5).
    pub fn insert(&self, event_time: i64, observations: &[PortObservation]) -> Result<()> {
        let cfg = self.cfg.read().clone();
        let table = cfg.history_table();
        let mut conn = self.rw.lock();
        let min_interval = cfg.min_insert_interval.as_secs() as i64;
        let watch = deadline::install(&conn, &self.cancel, cfg.query_deadline);
        let result = ingest::insert(&mut conn, &table, &self.shared, min_interval, event_time, observations);
        deadline::finish(&conn, watch, "insert", cfg.query_deadline, result)
    }

    /// `SetEventType(device, port, timestamp, event_type, event_reason)` (§4.7).
    /// Bounded by `query_deadline` (§5).
    pub fn set_event_type(
        &self,
        device: &str,
        port: u16,
        timestamp: i64,
        event_type: &str,
        event_reason: &str,
    ) -> Result<()> {
        let cfg = self.cfg.read().clone();
        let table = cfg.history_table();
        let device = normalize(device);
        let conn = self.rw.lock();
        let watch = deadline::install(&conn, &self.cancel, cfg.query_deadline);
        let result = crate::annotate::set_event_type(&conn, &table, &device, port, timestamp, event_type, event_reason);
        deadline::finish(&conn, watch, "set_event_type", cfg.query_deadline, result)
    }

    /// `Events(since)` (§4.10). Bounded by `query_deadline` (§5).
    pub fn events(&self, since: i64) -> Result<Vec<Event>> {
        let cfg = self.cfg.read().clone();
        let conn = self.ro.lock();
        let watch = deadline::install(&conn, &self.cancel, cfg.query_deadline);
        let result = query::events_since(&conn, &cfg.history_table(), &cfg.metadata_table(), since);
        deadline::finish(&conn, watch, "events", cfg.query_deadline, result)
    }

    /// `Tombstone(timestamp)` (§4.9). Bounded by `query_deadline` (§5).
    pub fn tombstone(&self, timestamp: i64) -> Result<()> {
        let cfg = self.cfg.read().clone();
        let conn = self.rw.lock();
        let watch = deadline::install(&conn, &self.cancel, cfg.query_deadline);
        let result = purge::tombstone(&conn, &cfg.metadata_table(), timestamp);
        deadline::finish(&conn, watch, "tombstone", cfg.query_deadline, result)
    }

    /// `Scan()` (§4.8). Locks the read-only handle, then the read-write handle, for
    /// the duration of the pass — the one lock ordering every other method respects,
    /// so this never deadlocks against a concurrent `Insert`/`Events`/`Tombstone`.
    /// Bounded by `query_deadline` (§5) across both handles.
    pub fn scan(&self) -> Result<()> {
        let cfg = self.cfg.read().clone();
        let ro = self.ro.lock();
        let rw = self.rw.lock();
        let now = now_unix();
        let rw_conn: &Connection = &rw;
        let ro_conn: &Connection = &ro;
        let watch = deadline::install_multi(&[rw_conn, ro_conn], &self.cancel, cfg.query_deadline);
        let result = scan::run(&rw, &ro, &cfg, &self.shared, now);
        deadline::finish_multi(&[rw_conn, ro_conn], watch, "scan", cfg.query_deadline, result)
    }

    /// Run one purge cycle synchronously, outside the background schedule. Exposed
    /// for tests and for callers that want to force a sweep (e.g. right after a
    /// `Tombstone` call) rather than waiting for the next `purge_interval` tick.
    /// Bounded by `purge_deadline` (§5).
    pub fn purge_now(&self) -> Result<usize> {
        let cfg = self.cfg.read().clone();
        let conn = self.rw.lock();
        let now = now_unix();
        let watch = deadline::install(&conn, &self.cancel, cfg.purge_deadline);
        let result = purge::purge_once(&conn, &cfg, now);
        deadline::finish(&conn, watch, "purge", cfg.purge_deadline, result)
    }

    /// Signal the root cancellation scope and join the background purger thread.
    pub fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.purger.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.purger.take() {
            let _ = handle.join();
        }
    }
}
