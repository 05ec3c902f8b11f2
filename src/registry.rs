//! The authoritative turnout registry.
//!
//! [`TurnoutRegistry`] owns every [`Turnout`] known to the station, in
//! insertion order, together with a dirty flag that drives persistence.
//! Command handlers, the packet snoop, the OpenLCB consumer and the
//! persistence task all share one registry through an `Arc`.
//!
//! # Locking
//!
//! A single `Mutex` guards the collection and the dirty flag. Critical
//! sections only touch in-memory state: notifications (refresh requests,
//! event reports), storage writes and logging all happen after the guard is
//! dropped. A second lock orders [`TurnoutRegistry::persist`] writes and is
//! never taken on the command path. A poisoned lock is recovered, so a panic
//! in one caller never disables the registry.
//!
//! # Example
//!
//! ```rust
//! use rs_turnouts::config::TurnoutConfig;
//! use rs_turnouts::hal::{MockEventSink, MockScheduler, MockStorage};
//! use rs_turnouts::registry::TurnoutRegistry;
//! use rs_turnouts::dccpp::response;
//!
//! let storage = MockStorage::new().with_document(
//!     "turnouts.json",
//!     r#"[{"address":5,"type":0,"state":0}]"#,
//! );
//! let registry = TurnoutRegistry::load(
//!     TurnoutConfig::default(),
//!     storage,
//!     MockEventSink::new(),
//!     MockScheduler::new(),
//! );
//!
//! assert_eq!(response(&registry.toggle(5)), "<H 5 1>");
//! assert_eq!(registry.scheduler().notifications(), vec![(5, 1)]);
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, error, info, warn};

use crate::codec::is_valid_address;
use crate::config::TurnoutConfig;
use crate::dccpp::{write_bulk_status, TurnoutStatus, COMMAND_FAILED_RESPONSE};
use crate::error::TurnoutError;
use crate::events::parse_event_list;
use crate::packet::DccPacket;
use crate::traits::{EventSink, PacketScheduler, Storage};
use crate::turnout::{Notification, Turnout, TurnoutRecord, TurnoutType};

/// Collection and dirty flag, always accessed under the registry lock.
#[derive(Debug, Default)]
struct Inner {
    turnouts: Vec<Turnout>,
    dirty: bool,
}

impl Inner {
    fn position(&self, address: u16) -> Option<usize> {
        self.turnouts.iter().position(|t| t.address() == address)
    }

    fn position_by_id(&self, id: u16) -> Option<usize> {
        self.turnouts.iter().position(|t| t.id() == id)
    }

    fn to_json(&self, readable: bool) -> Result<String, TurnoutError> {
        let records: Vec<TurnoutRecord> = self
            .turnouts
            .iter()
            .map(|turnout| turnout.to_record(readable))
            .collect();
        Ok(serde_json::to_string(&records)?)
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Thread-safe registry of all turnouts.
///
/// Generic over its collaborators so tests can observe every side effect:
///
/// - `S`: where the turnout document is persisted
/// - `E`: where OpenLCB-bound turnouts send their events
/// - `P`: the track output layer that pulls DCC packets
pub struct TurnoutRegistry<S, E, P> {
    inner: Mutex<Inner>,
    // Held from snapshot through store so writes land in snapshot order.
    persist_lock: Mutex<()>,
    config: TurnoutConfig,
    storage: S,
    events: E,
    scheduler: P,
}

impl<S: Storage, E: EventSink, P: PacketScheduler> TurnoutRegistry<S, E, P> {
    /// Creates an empty registry without reading storage.
    pub fn new(config: TurnoutConfig, storage: S, events: E, scheduler: P) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            persist_lock: Mutex::new(()),
            config,
            storage,
            events,
            scheduler,
        }
    }

    /// Creates the registry from the persisted document.
    ///
    /// Never fails: a missing document, a storage error or a corrupt
    /// document all start with an empty registry (logged). Individual
    /// entries that cannot be loaded are skipped.
    pub fn load(config: TurnoutConfig, storage: S, events: E, scheduler: P) -> Self {
        let registry = Self::new(config, storage, events, scheduler);
        let key = registry.config.storage_key.as_str();
        let turnouts = match registry.storage.load(key) {
            Ok(Some(document)) => parse_document(&document),
            Ok(None) => {
                info!("[Turnouts] No persisted turnouts in '{}'", key);
                Vec::new()
            }
            Err(err) => {
                error!("[Turnouts] Failed to read '{}': {}", key, err);
                Vec::new()
            }
        };
        info!("[Turnouts] Loaded {} turnout(s)", turnouts.len());
        registry.lock().turnouts = turnouts;
        registry
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registry configuration.
    pub fn config(&self) -> &TurnoutConfig {
        &self.config
    }

    /// The storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The OpenLCB event sink.
    pub fn events(&self) -> &E {
        &self.events
    }

    /// The track packet scheduler.
    pub fn scheduler(&self) -> &P {
        &self.scheduler
    }

    fn dispatch(&self, notification: Option<Notification>) {
        match notification {
            Some(Notification::Refresh { address, code }) => {
                self.scheduler.notify_update(address, code);
            }
            Some(Notification::Events(events)) => {
                for event in events {
                    self.events.send_event(event);
                }
            }
            None => {}
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Sets the state of the turnout at `address`.
    ///
    /// `send_dcc` controls notification: a DCC turnout requests a packet
    /// refresh, an OpenLCB turnout produces its events. Passive updates
    /// (snooped packets, inactivate events) pass `false`.
    ///
    /// Unknown addresses fail with [`TurnoutError::NotFound`] unless
    /// create-on-demand is enabled, in which case a plain `LEFT` turnout is
    /// created first.
    pub fn set(
        &self,
        address: u16,
        thrown: bool,
        send_dcc: bool,
    ) -> Result<TurnoutStatus, TurnoutError> {
        self.command(address, |turnout| turnout.set(thrown, send_dcc))
    }

    /// Toggles the turnout at `address`, always notifying.
    ///
    /// Same not-found policy as [`TurnoutRegistry::set`].
    pub fn toggle(&self, address: u16) -> Result<TurnoutStatus, TurnoutError> {
        self.command(address, |turnout| turnout.toggle(true))
    }

    fn command<F>(&self, address: u16, apply: F) -> Result<TurnoutStatus, TurnoutError>
    where
        F: FnOnce(&mut Turnout) -> Option<Notification>,
    {
        let (status, notification, created) = {
            let mut inner = self.lock();
            let (index, created) = match inner.position(address) {
                Some(index) => (index, false),
                None if self.config.create_on_demand && is_valid_address(address) => {
                    inner
                        .turnouts
                        .push(Turnout::dcc(address, None, false, TurnoutType::Left));
                    (inner.turnouts.len() - 1, true)
                }
                None => {
                    drop(inner);
                    warn!("[Turnouts] Turnout {} not found", address);
                    return Err(if is_valid_address(address) {
                        TurnoutError::NotFound(address)
                    } else {
                        TurnoutError::InvalidAddress(address)
                    });
                }
            };
            let turnout = &mut inner.turnouts[index];
            let notification = apply(turnout);
            let status = TurnoutStatus::of(turnout);
            inner.dirty = true;
            (status, notification, created)
        };

        if created {
            info!("[Turnouts] Turnout {} created on demand", address);
        }
        debug!(
            "[Turnout {}] Set to {}",
            address,
            if status.thrown { "THROWN" } else { "CLOSED" }
        );
        self.dispatch(notification);
        Ok(status)
    }

    /// Creates or updates a DCC turnout and returns a snapshot of it.
    ///
    /// Lookup order: by `id` when given (moving that turnout to `address`),
    /// then by `address`, else a new turnout is appended. `kind: None`
    /// keeps the existing type (new turnouts default to `LEFT`); `id: None`
    /// makes the id follow the address.
    ///
    /// Moving a turnout onto an address owned by another turnout fails with
    /// [`TurnoutError::AddressInUse`].
    pub fn create_or_update_dcc(
        &self,
        address: u16,
        kind: Option<TurnoutType>,
        id: Option<u16>,
    ) -> Result<Turnout, TurnoutError> {
        if !is_valid_address(address) {
            return Err(TurnoutError::InvalidAddress(address));
        }
        let (turnout, created) = {
            let mut inner = self.lock();
            let by_id = id.filter(|id| *id > 0).and_then(|id| inner.position_by_id(id));
            let existing = match by_id {
                Some(index) => {
                    if inner.position(address).is_some_and(|other| other != index) {
                        drop(inner);
                        warn!(
                            "[Turnouts] Cannot move turnout {:?} to {}: address in use",
                            id, address
                        );
                        return Err(TurnoutError::AddressInUse(address));
                    }
                    Some(index)
                }
                None => inner.position(address),
            };
            let created = existing.is_none();
            let index = match existing {
                Some(index) => {
                    inner.turnouts[index].update(address, kind, id);
                    index
                }
                None => {
                    let kind = kind.unwrap_or_default();
                    inner.turnouts.push(Turnout::dcc(address, id, false, kind));
                    inner.turnouts.len() - 1
                }
            };
            inner.dirty = true;
            (inner.turnouts[index].clone(), created)
        };
        info!(
            "[Turnout {}] {} (id {}, {})",
            turnout.address(),
            if created { "Registered" } else { "Updated" },
            turnout.id(),
            turnout.kind()
        );
        Ok(turnout)
    }

    /// Creates or updates an OpenLCB-bound turnout and returns a snapshot.
    ///
    /// `closed_events` and `thrown_events` are comma separated event IDs in
    /// any notation [`crate::events::EventId`] parses. An existing OpenLCB
    /// turnout gets its type updated, its id reset to the address and its
    /// event lists replaced. An existing DCC turnout keeps its binding: only
    /// type and id change and the event lists are ignored.
    pub fn create_or_update_olcb(
        &self,
        address: u16,
        closed_events: &str,
        thrown_events: &str,
        kind: Option<TurnoutType>,
    ) -> Result<Turnout, TurnoutError> {
        if !is_valid_address(address) {
            return Err(TurnoutError::InvalidAddress(address));
        }
        let closed = parse_event_list(closed_events)?;
        let thrown = parse_event_list(thrown_events)?;

        let (turnout, created, events_applied) = {
            let mut inner = self.lock();
            let (index, created, events_applied) = match inner.position(address) {
                Some(index) => {
                    let turnout = &mut inner.turnouts[index];
                    turnout.update(address, kind, None);
                    (index, false, turnout.set_events(closed, thrown))
                }
                None => {
                    let kind = kind.unwrap_or_default();
                    inner
                        .turnouts
                        .push(Turnout::openlcb(address, None, closed, thrown, false, kind));
                    (inner.turnouts.len() - 1, true, true)
                }
            };
            inner.dirty = true;
            (inner.turnouts[index].clone(), created, events_applied)
        };

        if !events_applied {
            warn!(
                "[Turnout {}] Is a DCC turnout, OpenLCB events ignored",
                address
            );
        }
        info!(
            "[Turnout {}] {} OpenLCB turnout ({} closed / {} thrown event(s))",
            address,
            if created { "Registered" } else { "Updated" },
            turnout.closed_events().len(),
            turnout.thrown_events().len()
        );
        Ok(turnout)
    }

    /// Removes the turnout at `address`. Returns `false` if there was none.
    pub fn remove(&self, address: u16) -> bool {
        let removed = {
            let mut inner = self.lock();
            match inner.position(address) {
                Some(index) => {
                    inner.turnouts.remove(index);
                    inner.dirty = true;
                    true
                }
                None => false,
            }
        };
        if removed {
            info!("[Turnout {}] Deleted", address);
        } else {
            warn!("[Turnout {}] Not found", address);
        }
        removed
    }

    /// Drops every turnout (factory reset).
    pub fn clear(&self) {
        let count = {
            let mut inner = self.lock();
            let count = inner.turnouts.len();
            inner.turnouts.clear();
            inner.dirty = true;
            count
        };
        info!("[Turnouts] Cleared {} turnout(s)", count);
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Snapshot of the turnout at `address`.
    pub fn get(&self, address: u16) -> Option<Turnout> {
        let inner = self.lock();
        inner
            .position(address)
            .map(|index| inner.turnouts[index].clone())
    }

    /// Snapshot of the first turnout with this id.
    pub fn get_by_id(&self, id: u16) -> Option<Turnout> {
        let inner = self.lock();
        inner
            .position_by_id(id)
            .map(|index| inner.turnouts[index].clone())
    }

    /// Snapshot of every turnout, in insertion order.
    pub fn turnouts(&self) -> Vec<Turnout> {
        self.lock().turnouts.clone()
    }

    /// Number of turnouts.
    pub fn count(&self) -> usize {
        self.lock().turnouts.len()
    }

    /// Whether there are changes not yet persisted.
    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// JSON array of all turnouts; `"[]"` when empty.
    pub fn to_json(&self, readable: bool) -> String {
        let rendered = self.lock().to_json(readable);
        rendered.unwrap_or_else(|err| {
            error!("[Turnouts] Failed to render turnouts: {}", err);
            String::from("[]")
        })
    }

    /// JSON of one turnout, `"{}"` when absent.
    pub fn turnout_json(&self, address: u16, readable: bool) -> String {
        match self.get(address) {
            Some(turnout) => turnout.to_json(readable),
            None => String::from("{}"),
        }
    }

    /// Legacy bulk status: `<H id board port state>` per turnout, or the
    /// failure token when there are none.
    pub fn state_for_wire_protocol(&self) -> String {
        let inner = self.lock();
        if inner.turnouts.is_empty() {
            return COMMAND_FAILED_RESPONSE.to_string();
        }
        let mut status = String::new();
        for turnout in &inner.turnouts {
            write_bulk_status(&mut status, turnout);
        }
        status
    }

    /// Packet for a refresh slot granted to `address`.
    ///
    /// Stamped with the configured repeat count. `None` when the turnout is
    /// gone or not DCC-bound. Only reads already-stored state; never
    /// notifies.
    pub fn next_packet(&self, address: u16, code: u32) -> Option<DccPacket> {
        let packet = {
            let inner = self.lock();
            let index = inner.position(address)?;
            inner.turnouts[index].next_packet(code)
        };
        packet.map(|packet| packet.with_repeat_count(self.config.packet_repeats))
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Writes the registry to storage if anything changed.
    ///
    /// Returns `Ok(true)` when a document was written, `Ok(false)` when
    /// there was nothing to do. The document is rendered under the lock and
    /// written after releasing it. Concurrent calls are serialized, so an
    /// older snapshot never overwrites a newer one. On a failed write the
    /// dirty flag is restored so the next cycle retries. An empty registry
    /// is never written and stays dirty.
    pub fn persist(&self) -> Result<bool, TurnoutError> {
        let _writer = self
            .persist_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (document, count) = {
            let mut inner = self.lock();
            if !inner.dirty || inner.turnouts.is_empty() {
                drop(inner);
                debug!("[Turnouts] No entries require persistence");
                return Ok(false);
            }
            let document = inner.to_json(false)?;
            inner.dirty = false;
            (document, inner.turnouts.len())
        };

        info!("[Turnouts] Persisting {} turnout(s)", count);
        let key = self.config.storage_key.as_str();
        if let Err(err) = self.storage.store(key, &document) {
            self.lock().dirty = true;
            error!("[Turnouts] Failed to write '{}': {}", key, err);
            return Err(TurnoutError::Storage(err.to_string()));
        }
        Ok(true)
    }
}

// ============================================================================
// Document Parsing
// ============================================================================

/// Parses a persisted turnout document.
///
/// A document that is not a JSON array yields no turnouts. Entries that are
/// missing required fields, carry an invalid address or bad event IDs, or
/// repeat an address already loaded are skipped. Every rejection is logged.
pub fn parse_document(document: &str) -> Vec<Turnout> {
    let entries: Vec<serde_json::Value> = match serde_json::from_str(document) {
        Ok(entries) => entries,
        Err(err) => {
            error!("[Turnouts] Persisted turnouts are corrupt: {}", err);
            return Vec::new();
        }
    };

    let mut turnouts: Vec<Turnout> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let turnout = serde_json::from_value::<TurnoutRecord>(entry)
            .map_err(TurnoutError::from)
            .and_then(Turnout::try_from);
        match turnout {
            Ok(turnout) if turnouts.iter().any(|t| t.address() == turnout.address()) => {
                warn!(
                    "[Turnouts] Entry {} duplicates address {}, skipped",
                    index,
                    turnout.address()
                );
            }
            Ok(turnout) => {
                debug!(
                    "[Turnout {}] Loaded (id {}, {}, {})",
                    turnout.address(),
                    turnout.id(),
                    turnout.kind(),
                    turnout.state()
                );
                turnouts.push(turnout);
            }
            Err(err) => warn!("[Turnouts] Entry {} skipped: {}", index, err),
        }
    }
    turnouts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_invalid_entries() {
        let turnouts = parse_document(
            r#"[
                {"address":1,"type":0,"state":0},
                {"address":0,"type":0,"state":0},
                {"address":2045,"type":0,"state":1},
                {"type":0,"state":0},
                {"address":3,"state":0},
                {"address":4,"type":0},
                {"address":5,"type":1,"state":1,"id":50}
            ]"#,
        );
        let addresses: Vec<u16> = turnouts.iter().map(Turnout::address).collect();
        assert_eq!(addresses, vec![1, 5]);
        assert_eq!(turnouts[1].id(), 50);
    }

    #[test]
    fn parse_picks_binding_from_openlcb_object() {
        let turnouts = parse_document(
            r#"[{"address":12,"type":2,"state":0,"openlcb":{"closed":"1.2.3.4.5.6.7.8","thrown":"0x0102030405060709"}}]"#,
        );
        assert_eq!(turnouts.len(), 1);
        assert!(turnouts[0].is_openlcb());
        assert_eq!(turnouts[0].thrown_events()[0].value(), 0x0102_0304_0506_0709);
    }

    #[test]
    fn parse_corrupt_document_is_empty() {
        assert!(parse_document("not json").is_empty());
        assert!(parse_document(r#"{"address":1}"#).is_empty());
    }

    #[test]
    fn parse_skips_duplicate_addresses() {
        let turnouts = parse_document(
            r#"[{"address":7,"type":0,"state":0},{"address":7,"type":1,"state":1}]"#,
        );
        assert_eq!(turnouts.len(), 1);
        assert!(!turnouts[0].is_thrown());
    }

    #[test]
    fn inner_renders_empty_array() {
        assert_eq!(Inner::default().to_json(true).unwrap(), "[]");
    }
}
