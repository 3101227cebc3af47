//! Transient and persistent data shapes shared across the engine.

/// A single port observation as delivered by an `Insert` call.
///
/// Only `link_layer == "infiniband"` (case-insensitive) observations are retained;
/// everything else is dropped silently by the Ingestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortObservation {
    /// Device name as reported by the source, e.g. `mlx5_0`.
    pub device: String,
    /// Port number within the device.
    pub port: u16,
    /// Link layer of this port, e.g. `infiniband` or `ethernet`.
    pub link_layer: String,
    /// Logical port state, e.g. `active`, `down`.
    pub state: String,
    /// Physical port state, e.g. `linkup`, `disabled`.
    pub physical_state: String,
    /// Negotiated link rate in Gb/s.
    pub rate_gb_sec: i32,
    /// Cumulative link-down counter as reported by the device.
    pub total_link_downed: u64,
}

/// Full IB port tuple as carried by a derived `Event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IbPort {
    /// Device name, e.g. `mlx5_0`.
    pub device: String,
    /// Port number within the device.
    pub port: u16,
    /// Link layer of this port, e.g. `infiniband` or `ethernet`.
    pub link_layer: String,
    /// Logical port state, e.g. `active`, `down`.
    pub state: String,
    /// Physical port state, e.g. `linkup`, `disabled`.
    pub physical_state: String,
    /// Negotiated link rate in Gb/s.
    pub rate_gb_sec: i32,
    /// Cumulative link-down counter as reported by the device.
    pub total_link_downed: u64,
}

/// Known event types. Stored as plain text in `event_type`; the set is extensible,
/// so callers comparing against it should match on the string constants below rather
/// than assume this enum is exhaustive of everything ever written to the column.
pub mod event_type {
    /// A port-drop event: an active port observed as non-active (§4.5).
    pub const DROP: &str = "ib_port_drop";
    /// A port-flap event: repeated drop/recover cycles within a window (§4.6).
    pub const FLAP: &str = "ib_port_flap";
    /// Sentinel for "not yet annotated" — never itself written as an `Event`.
    pub const NONE: &str = "";
}

/// A derived event: a history row whose `event_type` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Unix-second timestamp of the history row this event was derived from.
    pub time: i64,
    /// The port this event is about.
    pub port: IbPort,
    /// One of the `event_type` constants.
    pub event_type: String,
    /// Human-readable explanation, e.g. including the RFC3339 time of the prior state.
    pub event_reason: String,
}

/// One `(ts, state, total_link_downed)` point read back by the Snapshot Reader.
///
/// `state` is already normalized (trimmed, lowercased) by the Ingestor at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Unix-second timestamp of this observation.
    pub ts: i64,
    /// Normalized logical port state.
    pub state: String,
    /// Cumulative link-down counter at this observation.
    pub total_link_downed: u64,
}

impl Snapshot {
    /// Whether this snapshot's state counts as active. Anything other than exactly
    /// `"active"` (e.g. `"down"`, `"init"`) counts as non-active per §4.5/§4.6.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == "active"
    }
}

/// Identifies one IB port for scanning/detection purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortKey {
    /// Device name, e.g. `mlx5_0`.
    pub device: String,
    /// Port number within the device.
    pub port: u16,
}

/// Normalize a storage string per §4.3: trim, then lowercase.
#[must_use]
pub fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}
