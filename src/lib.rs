#![forbid(unsafe_code)]

//! `ibstore` — InfiniBand Port History & Event Engine.
//!
//! Persists periodic IB port snapshots into a durable relational log, derives
//! "port drop" and "port flap" events from sliding windows over that log, and
//! exposes those events to operators alongside a tombstone reset and a
//! retention-bounded garbage collector.
//!
//! This crate does not read hardware state, run `ibstat`/`ibportstate`, speak any
//! network protocol, or decide what to do about a flapping port — it is a storage
//! and detection engine, not a collector or a remediation system. Callers feed it
//! [`PortObservation`] batches; it feeds back [`Event`]s.
//!
//! ```no_run
//! use ibstore::{CancelToken, Store};
//! use rusqlite::{Connection, OpenFlags};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rw = Connection::open("ib_history.db")?;
//! let ro = Connection::open_with_flags("ib_history.db", OpenFlags::SQLITE_OPEN_READ_ONLY)?;
//! let store = Store::new(CancelToken::new(), rw, ro)?;
//! let events = store.events(0)?;
//! # let _ = events;
//! # Ok(())
//! # }
//! ```

mod annotate;
mod cancel;
mod config;
mod db;
mod deadline;
mod detect;
mod errors;
mod ingest;
mod model;
mod purge;
mod purger_thread;
mod query;
mod reader;
mod scan;
mod shared_state;
mod store;
mod time;

pub use cancel::CancelToken;
pub use config::{SCHEMA_VERSION, StoreConfig};
pub use errors::{IbStoreError, Result};
pub use model::{Event, IbPort, PortKey, PortObservation, event_type};
pub use store::Store;
