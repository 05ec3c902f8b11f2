//! Mock implementations for testing without storage, network or track.
//!
//! Every mock records what the registry did to it, behind a `Mutex` so the
//! registry can share it across threads exactly like the real thing.
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockStorage`] | [`Storage`] | In-memory documents, write counter, failure injection |
//! | [`MockEventSink`] | [`EventSink`] | Records produced events |
//! | [`MockScheduler`] | [`PacketScheduler`] | Records refresh requests |
//! | [`MockTrack`] | [`PacketObserver`] | Records observed packets |
//!
//! # Example
//!
//! ```rust
//! use rs_turnouts::hal::MockStorage;
//! use rs_turnouts::traits::Storage;
//!
//! let storage = MockStorage::new();
//! storage.store("turnouts.json", "[]").unwrap();
//! assert_eq!(storage.write_count(), 1);
//!
//! storage.set_failing(true);
//! assert!(storage.store("turnouts.json", "[]").is_err());
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::events::EventId;
use crate::packet::DccPacket;
use crate::traits::{EventSink, PacketObserver, PacketScheduler, Storage};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Storage Mock
// ============================================================================

/// Error returned by [`MockStorage`] while failure injection is on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mock storage failure writing '{0}'")]
pub struct MockStorageError(pub String);

#[derive(Debug, Default)]
struct StorageState {
    documents: HashMap<String, String>,
    writes: usize,
    failing: bool,
}

/// In-memory [`Storage`] with a write counter and failure injection.
#[derive(Debug, Default)]
pub struct MockStorage {
    state: Mutex<StorageState>,
}

impl MockStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-loads a document (does not count as a write).
    pub fn with_document(self, key: &str, contents: &str) -> Self {
        lock(&self.state)
            .documents
            .insert(key.to_string(), contents.to_string());
        self
    }

    /// Makes subsequent loads and stores fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }

    /// Number of successful stores.
    pub fn write_count(&self) -> usize {
        lock(&self.state).writes
    }

    /// Current contents of a document.
    pub fn document(&self, key: &str) -> Option<String> {
        lock(&self.state).documents.get(key).cloned()
    }
}

impl Storage for MockStorage {
    type Error = MockStorageError;

    fn load(&self, key: &str) -> Result<Option<String>, MockStorageError> {
        let state = lock(&self.state);
        if state.failing {
            return Err(MockStorageError(key.to_string()));
        }
        Ok(state.documents.get(key).cloned())
    }

    fn store(&self, key: &str, contents: &str) -> Result<(), MockStorageError> {
        let mut state = lock(&self.state);
        if state.failing {
            return Err(MockStorageError(key.to_string()));
        }
        state.documents.insert(key.to_string(), contents.to_string());
        state.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Network Mock
// ============================================================================

/// [`EventSink`] that records every produced event.
#[derive(Debug, Default)]
pub struct MockEventSink {
    sent: Mutex<Vec<EventId>>,
}

impl MockEventSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events produced so far, in order.
    pub fn sent(&self) -> Vec<EventId> {
        lock(&self.sent).clone()
    }

    /// Forgets recorded events.
    pub fn clear(&self) {
        lock(&self.sent).clear();
    }
}

impl EventSink for MockEventSink {
    fn send_event(&self, event: EventId) {
        lock(&self.sent).push(event);
    }
}

// ============================================================================
// Track Mocks
// ============================================================================

/// [`PacketScheduler`] that records `(address, code)` refresh requests.
#[derive(Debug, Default)]
pub struct MockScheduler {
    notifications: Mutex<Vec<(u16, u32)>>,
}

impl MockScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh requests so far, in order.
    pub fn notifications(&self) -> Vec<(u16, u32)> {
        lock(&self.notifications).clone()
    }

    /// Forgets recorded requests.
    pub fn clear(&self) {
        lock(&self.notifications).clear();
    }
}

impl PacketScheduler for MockScheduler {
    fn notify_update(&self, address: u16, code: u32) {
        lock(&self.notifications).push((address, code));
    }
}

/// A stand-in transmit path: forwards packets to observers and keeps them.
#[derive(Default)]
pub struct MockTrack {
    observers: Vec<Box<dyn PacketObserver + Send + Sync>>,
    transmitted: Mutex<Vec<DccPacket>>,
}

impl MockTrack {
    /// Creates a track without observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer that sees every transmitted packet.
    pub fn with_observer(mut self, observer: impl PacketObserver + Send + Sync + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Puts a packet on the "rails".
    pub fn transmit(&self, packet: DccPacket) {
        for observer in &self.observers {
            observer.observe(&packet);
        }
        lock(&self.transmitted).push(packet);
    }

    /// Packets transmitted so far.
    pub fn transmitted(&self) -> Vec<DccPacket> {
        lock(&self.transmitted).clone()
    }
}

impl PacketObserver for MockTrack {
    fn observe(&self, packet: &DccPacket) {
        self.transmit(packet.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_preloaded_document() {
        let storage = MockStorage::new().with_document("a", "[1]");
        assert_eq!(storage.load("a").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.load("b").unwrap(), None);
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn storage_failure_injection() {
        let storage = MockStorage::new();
        storage.set_failing(true);
        assert_eq!(
            storage.store("a", "x"),
            Err(MockStorageError("a".to_string()))
        );
        assert_eq!(storage.write_count(), 0);
        storage.set_failing(false);
        storage.store("a", "x").unwrap();
        assert_eq!(storage.document("a").as_deref(), Some("x"));
    }

    #[test]
    fn event_sink_records_in_order() {
        let sink = MockEventSink::new();
        sink.send_event(EventId(2));
        sink.send_event(EventId(1));
        assert_eq!(sink.sent(), vec![EventId(2), EventId(1)]);
        sink.clear();
        assert!(sink.sent().is_empty());
    }

    #[test]
    fn scheduler_records_requests() {
        let scheduler = MockScheduler::new();
        scheduler.notify_update(5, 1);
        assert_eq!(scheduler.notifications(), vec![(5, 1)]);
    }

    #[test]
    fn track_forwards_to_observers() {
        let downstream = std::sync::Arc::new(MockTrack::new());
        let track = MockTrack::new().with_observer(std::sync::Arc::clone(&downstream));
        track.transmit(DccPacket::idle());
        assert_eq!(track.transmitted(), vec![DccPacket::idle()]);
        assert_eq!(downstream.transmitted(), vec![DccPacket::idle()]);
    }
}
