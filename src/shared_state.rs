//! In-memory caches guarded by reader-writer locks — `last_inserted_timestamp`,
//! `device_set`/`port_set` (collapsed here into one `PortKey` set). Rebuilt from the
//! log on startup (§3.2 invariant 5) and extended on each successful `Insert`.
//!
//! Uses `parking_lot::RwLock`, the same primitive a thread-supervising daemon loop
//! would guard its shared config and thread-health state with.

use std::collections::BTreeSet;

use parking_lot::RwLock;

use crate::model::PortKey;

pub(crate) struct SharedState {
    /// 0 means "no successful insert yet".
    last_inserted_timestamp: RwLock<i64>,
    known_ports: RwLock<BTreeSet<PortKey>>,
}

impl SharedState {
    pub(crate) fn new(last_inserted_timestamp: i64, known_ports: BTreeSet<PortKey>) -> Self {
        Self {
            last_inserted_timestamp: RwLock::new(last_inserted_timestamp),
            known_ports: RwLock::new(known_ports),
        }
    }

    pub(crate) fn last_inserted_timestamp(&self) -> i64 {
        *self.last_inserted_timestamp.read()
    }

    pub(crate) fn set_last_inserted_timestamp(&self, ts: i64) {
        *self.last_inserted_timestamp.write() = ts;
    }

    pub(crate) fn union_port(&self, key: PortKey) {
        self.known_ports.write().insert(key);
    }

    pub(crate) fn known_ports(&self) -> Vec<PortKey> {
        self.known_ports.read().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_given_watermark_and_set() {
        let mut set = BTreeSet::new();
        set.insert(PortKey { device: "mlx5_0".into(), port: 1 });
        let state = SharedState::new(42, set);
        assert_eq!(state.last_inserted_timestamp(), 42);
        assert_eq!(state.known_ports().len(), 1);
    }

    #[test]
    fn union_port_is_idempotent() {
        let state = SharedState::new(0, BTreeSet::new());
        let key = PortKey { device: "mlx5_0".into(), port: 1 };
        state.union_port(key.clone());
        state.union_port(key);
        assert_eq!(state.known_ports().len(), 1);
    }

    #[test]
    fn watermark_updates_are_visible() {
        let state = SharedState::new(0, BTreeSet::new());
        state.set_last_inserted_timestamp(100);
        assert_eq!(state.last_inserted_timestamp(), 100);
    }
}
