//! Conformance test suite for [`StateStore`] implementations.
//!
//! Call [`run_store_conformance_tests`] from a backend's own test module
//! against a fresh store instance.

use chrono::Utc;
use driftwatch_core::{AlertState, DecisionStatus, DeliveryRecord, DeliveryResult, EventType, Metrics, Snapshot, SnapshotMetadata};

use crate::error::StateError;
use crate::store::StateStore;

/// Run the full state store conformance test suite.
///
/// # Errors
///
/// Returns an error (or panics via a failed assertion) if any
/// conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn StateStore) -> Result<(), StateError> {
    test_missing_snapshot_is_none(store).await?;
    test_append_and_get_last(store).await?;
    test_alert_state_roundtrip(store).await?;
    test_log_delivery_does_not_error(store).await?;
    Ok(())
}

fn sample_snapshot(source: &str) -> Snapshot {
    Snapshot::success(
        source,
        Utc::now(),
        Metrics {
            row_count: Some(42),
            ..Default::default()
        },
        SnapshotMetadata {
            connector_type: "sql".into(),
            dialect: "postgres".into(),
            ..Default::default()
        },
    )
}

async fn test_missing_snapshot_is_none(store: &dyn StateStore) -> Result<(), StateError> {
    let result = store.get_last_snapshot(&"conformance-missing".into()).await?;
    assert!(result.is_none(), "get_last_snapshot on unseeded source should return None");
    Ok(())
}

async fn test_append_and_get_last(store: &dyn StateStore) -> Result<(), StateError> {
    let source_name = "conformance-append";
    store.append_snapshot(&sample_snapshot(source_name)).await?;
    let last = store.get_last_snapshot(&source_name.into()).await?;
    assert!(last.is_some(), "append_snapshot followed by get_last_snapshot should find a row");
    Ok(())
}

async fn test_alert_state_roundtrip(store: &dyn StateStore) -> Result<(), StateError> {
    let source = "conformance-alert-source".into();
    let target = "conformance-alert-target".into();
    assert!(store.get_alert_state(&source, &target).await?.is_none());

    let state = AlertState::unknown(source, target, Utc::now());
    store.set_alert_state(&state).await?;

    let fetched = store
        .get_alert_state(&state.source_name, &state.target_name)
        .await?
        .expect("alert state should be stored after set_alert_state");
    assert_eq!(fetched.notified_status, DecisionStatus::Unknown);
    Ok(())
}

async fn test_log_delivery_does_not_error(store: &dyn StateStore) -> Result<(), StateError> {
    let record = DeliveryRecord {
        source_name: "conformance-delivery-source".into(),
        target_name: "conformance-delivery-target".into(),
        event_type: EventType::Recovery,
        payload_hash: "0123456789abcdef".into(),
        sent_at: Utc::now(),
        result: DeliveryResult::ok(200, 10, 1),
    };
    store.log_delivery(&record).await
}
