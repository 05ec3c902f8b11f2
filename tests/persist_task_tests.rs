//! Integration tests for the periodic persistence task.

#![cfg(feature = "timer")]

use std::sync::Arc;
use std::time::Duration;

use rs_turnouts::hal::{MockEventSink, MockScheduler, MockStorage};
use rs_turnouts::{PersistenceTask, TurnoutConfig, TurnoutRegistry};

type Registry = TurnoutRegistry<MockStorage, MockEventSink, MockScheduler>;

fn registry() -> Arc<Registry> {
    Arc::new(TurnoutRegistry::new(
        TurnoutConfig::default(),
        MockStorage::new(),
        MockEventSink::new(),
        MockScheduler::new(),
    ))
}

#[tokio::test]
async fn task_flushes_dirty_registry() {
    let registry = registry();
    registry.create_or_update_dcc(5, None, None).unwrap();

    let task = PersistenceTask::spawn(Arc::clone(&registry), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(registry.storage().write_count(), 1);
    assert!(!registry.is_dirty());

    task.stop().await;
    // nothing changed since: the final flush is a no-op
    assert_eq!(registry.storage().write_count(), 1);
}

#[tokio::test]
async fn task_picks_up_later_changes() {
    let registry = registry();
    let task = PersistenceTask::spawn(Arc::clone(&registry), Duration::from_millis(20));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.storage().write_count(), 0);

    registry.create_or_update_dcc(5, None, None).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(registry.storage().write_count(), 1);

    task.stop().await;
}

#[tokio::test]
async fn stop_runs_final_flush() {
    let registry = registry();
    let task = PersistenceTask::spawn(Arc::clone(&registry), Duration::from_secs(3600));

    registry.create_or_update_dcc(5, None, None).unwrap();
    task.stop().await;

    assert_eq!(registry.storage().write_count(), 1);
    assert!(registry.storage().document("turnouts.json").is_some());
}

#[tokio::test]
async fn failed_write_is_retried_next_tick() {
    let registry = registry();
    registry.create_or_update_dcc(5, None, None).unwrap();
    registry.storage().set_failing(true);

    let task = PersistenceTask::spawn(Arc::clone(&registry), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(70)).await;
    assert_eq!(registry.storage().write_count(), 0);
    assert!(registry.is_dirty());

    registry.storage().set_failing(false);
    tokio::time::sleep(Duration::from_millis(70)).await;
    assert_eq!(registry.storage().write_count(), 1);

    task.stop().await;
}
