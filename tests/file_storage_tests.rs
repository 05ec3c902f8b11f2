//! Integration tests for file-backed storage.

use rs_turnouts::hal::{FileStorage, MockEventSink, MockScheduler};
use rs_turnouts::{Storage, TurnoutConfig, TurnoutRegistry, TurnoutType};

#[test]
fn missing_file_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    assert_eq!(storage.load("turnouts.json").unwrap(), None);
}

#[test]
fn store_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());

    storage.store("turnouts.json", "[1]").unwrap();
    storage.store("turnouts.json", "[2]").unwrap();

    assert_eq!(storage.load("turnouts.json").unwrap().as_deref(), Some("[2]"));
}

#[test]
fn store_leaves_no_temporary_file() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    storage.store("turnouts.json", "[]").unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["turnouts.json".to_string()]);
}

#[test]
fn store_creates_missing_directories() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("station"));
    storage.store("layout/turnouts.json", "[]").unwrap();
    assert!(dir.path().join("station/layout/turnouts.json").exists());
}

#[test]
fn registry_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let registry = TurnoutRegistry::load(
        TurnoutConfig::default(),
        FileStorage::new(dir.path()),
        MockEventSink::new(),
        MockScheduler::new(),
    );
    registry
        .create_or_update_dcc(100, Some(TurnoutType::Wye), Some(7))
        .unwrap();
    registry.set(100, true, false).unwrap();
    assert!(registry.persist().unwrap());

    let restarted = TurnoutRegistry::load(
        TurnoutConfig::default(),
        FileStorage::new(dir.path()),
        MockEventSink::new(),
        MockScheduler::new(),
    );
    let turnout = restarted.get(100).unwrap();
    assert_eq!(turnout.id(), 7);
    assert_eq!(turnout.kind(), TurnoutType::Wye);
    assert!(turnout.is_thrown());
}
