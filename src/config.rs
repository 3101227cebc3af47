//! Engine configuration: tunable thresholds and their production defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Schema version tag embedded in table names, e.g. `infiniband_device_port_history_v0_5_1`.
pub const SCHEMA_VERSION: &str = "v0_5_1";

/// Full engine configuration. Constructed programmatically by the embedding process —
/// the core has no CLI/env/file-loading surface of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// Reject inserts closer than this to the last accepted one.
    pub min_insert_interval: Duration,
    /// Drop Detector §4.5 condition (d): minimum persistent-down span.
    pub drop_persistence_threshold: Duration,
    /// Scanner's extra history read-back before `since` for drop detection.
    pub drop_lookback_period: Duration,
    /// Flap Detector §4.6 "persistent down" gate.
    pub flap_down_interval_threshold: Duration,
    /// Flap Detector §4.6 oscillation count gate.
    pub flap_back_to_active_threshold: u32,
    /// Scanner's extra history read-back for flap detection.
    pub flap_lookback_period: Duration,
    /// Purger's horizon for unannotated rows, absent a tombstone.
    pub retention_period: Duration,
    /// Purger loop cadence. Zero disables the background purger.
    pub purge_interval: Duration,
    /// Per-call deadline for insert/select database operations.
    pub query_deadline: Duration,
    /// Per-call deadline for purge database operations.
    pub purge_deadline: Duration,
    /// Table-name version suffix.
    pub schema_version: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            min_insert_interval: Duration::from_secs(15),
            drop_persistence_threshold: Duration::from_secs(4 * 60),
            drop_lookback_period: Duration::from_secs(10 * 60),
            flap_down_interval_threshold: Duration::from_secs(25),
            flap_back_to_active_threshold: 3,
            flap_lookback_period: Duration::from_secs(12 * 60 * 60 + 5 * 60),
            retention_period: Duration::from_secs(5 * 24 * 60 * 60),
            purge_interval: Duration::from_secs(10 * 60 * 60),
            query_deadline: Duration::from_secs(30),
            purge_deadline: Duration::from_secs(15),
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }
}

impl StoreConfig {
    /// Name of the history log table for this config's schema version.
    #[must_use]
    pub fn history_table(&self) -> String {
        format!("infiniband_device_port_history_{}", self.schema_version)
    }

    /// Name of the metadata table for this config's schema version.
    #[must_use]
    pub fn metadata_table(&self) -> String {
        format!("infiniband_metadata_{}", self.schema_version)
    }
}
