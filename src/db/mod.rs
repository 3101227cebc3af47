//! SQLite-backed History Log and Metadata Store.
//!
//! WAL mode, prepared-statement patterns, and the pragma/schema split below follow the
//! same shape as a dedicated connection-owning logger module, applied here to the
//! port-history and metadata tables instead of an activity/pressure log.

pub mod history;
pub mod metadata;
pub mod schema;
