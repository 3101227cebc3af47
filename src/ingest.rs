//! Ingestor — `Insert(event_time, [PortObservation])` (§4.3).

use rusqlite::Connection;

use crate::db::history;
use crate::errors::Result;
use crate::model::{PortKey, PortObservation, normalize};
use crate::shared_state::SharedState;

/// Apply the IB filter and field normalization from §4.3 to one observation.
/// Returns `None` if the observation's `link_layer` is not case-insensitively
/// `"infiniband"`.
fn normalize_observation(obs: &PortObservation) -> Option<PortObservation> {
    if !obs.link_layer.trim().eq_ignore_ascii_case("infiniband") {
        return None;
    }
    Some(PortObservation {
        device: normalize(&obs.device),
        port: obs.port,
        link_layer: normalize(&obs.link_layer),
        state: normalize(&obs.state),
        physical_state: normalize(&obs.physical_state),
        rate_gb_sec: obs.rate_gb_sec,
        total_link_downed: obs.total_link_downed,
    })
}

/// Run one `Insert` call: pre-filter + normalize, apply the minimum-interval gate,
/// write the accepted batch in one transaction, then update in-memory state.
pub(crate) fn insert(
    conn: &mut Connection,
    table: &str,
    shared: &SharedState,
    min_insert_interval_secs: i64,
    event_time: i64,
    observations: &[PortObservation],
) -> Result<()> {
    let last_inserted = shared.last_inserted_timestamp();
    if last_inserted != 0 && event_time < last_inserted + min_insert_interval_secs {
        // Best-effort rate limiter: succeed without writing or touching state (§4.3).
        return Ok(());
    }

    let accepted: Vec<PortObservation> = observations.iter().filter_map(normalize_observation).collect();

    if accepted.is_empty() {
        // Still a successful call per §4.3 — no IB ports in this batch is not an error.
        shared.set_last_inserted_timestamp(event_time);
        return Ok(());
    }

    history::insert_batch(conn, table, event_time, &accepted)?;

    shared.set_last_inserted_timestamp(event_time);
    for o in &accepted {
        shared.union_port(PortKey {
            device: o.device.clone(),
            port: o.port,
        });
    }
    eprintln!(
        "[IBSTORE-INGEST] accepted {} row(s) at ts={event_time}",
        accepted.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::db::schema::{apply_pragmas, apply_schema};
    use std::collections::BTreeSet;

    fn obs(device: &str, link_layer: &str) -> PortObservation {
        PortObservation {
            device: device.to_string(),
            port: 1,
            link_layer: link_layer.to_string(),
            state: "Active".to_string(),
            physical_state: "LinkUp".to_string(),
            rate_gb_sec: 100,
            total_link_downed: 0,
        }
    }

    fn setup() -> (Connection, String, SharedState) {
        let mut conn = Connection::open_in_memory().unwrap();
        let cfg = StoreConfig::default();
        apply_pragmas(&conn).unwrap();
        apply_schema(&mut conn, &cfg).unwrap();
        (conn, cfg.history_table(), SharedState::new(0, BTreeSet::new()))
    }

    #[test]
    fn non_ib_observations_are_dropped() {
        let (mut conn, table, shared) = setup();
        insert(&mut conn, &table, &shared, 15, 100, &[obs(" MLX5_0 ", "ethernet")]).unwrap();
        let rows = history::select_snapshots(&conn, &table, "mlx5_0", 1, 0).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn ib_observations_are_normalized_and_stored() {
        let (mut conn, table, shared) = setup();
        insert(&mut conn, &table, &shared, 15, 100, &[obs(" MLX5_0 ", "InfiniBand")]).unwrap();
        let rows = history::select_snapshots(&conn, &table, "mlx5_0", 1, 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].state, "active");
    }

    #[test]
    fn min_interval_gate_rejects_close_inserts() {
        let (mut conn, table, shared) = setup();
        insert(&mut conn, &table, &shared, 15, 100, &[obs("mlx5_0", "infiniband")]).unwrap();
        insert(&mut conn, &table, &shared, 15, 110, &[obs("mlx5_0", "infiniband")]).unwrap();
        let rows = history::select_snapshots(&conn, &table, "mlx5_0", 1, 0).unwrap();
        assert_eq!(rows.len(), 1, "second insert within min interval must be dropped");
    }

    #[test]
    fn insert_past_min_interval_is_accepted() {
        let (mut conn, table, shared) = setup();
        insert(&mut conn, &table, &shared, 15, 100, &[obs("mlx5_0", "infiniband")]).unwrap();
        insert(&mut conn, &table, &shared, 15, 116, &[obs("mlx5_0", "infiniband")]).unwrap();
        let rows = history::select_snapshots(&conn, &table, "mlx5_0", 1, 0).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn known_ports_updated_on_success() {
        let (mut conn, table, shared) = setup();
        insert(&mut conn, &table, &shared, 15, 100, &[obs("mlx5_0", "infiniband")]).unwrap();
        assert_eq!(shared.known_ports().len(), 1);
    }

    #[test]
    fn batch_with_mixed_layers_stores_only_ib_rows() {
        let (mut conn, table, shared) = setup();
        insert(
            &mut conn,
            &table,
            &shared,
            15,
            100,
            &[obs("mlx5_0", "infiniband"), obs("eth0", "ethernet")],
        )
        .unwrap();
        let rows = history::select_snapshots(&conn, &table, "mlx5_0", 1, 0).unwrap();
        assert_eq!(rows.len(), 1);
        let eth_rows = history::select_snapshots(&conn, &table, "eth0", 1, 0).unwrap();
        assert!(eth_rows.is_empty());
    }
}
