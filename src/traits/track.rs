//! Track output hooks.
//!
//! The track output layer owns the packet queue. A DCC turnout never pushes
//! packets; it asks for a refresh slot through [`PacketScheduler`] and the
//! output layer later pulls the packet with
//! [`crate::registry::TurnoutRegistry::next_packet`].
//!
//! In the other direction every packet put on the rails, whoever produced
//! it, is offered to the [`PacketObserver`]s so that accessory commands from
//! other equipment keep the registry in sync.

extern crate alloc;
use alloc::sync::Arc;

use crate::packet::DccPacket;

/// Schedules packet refreshes on the track output layer.
pub trait PacketScheduler {
    /// Request a refresh slot for the turnout at `address`.
    ///
    /// `code` is handed back when the packet is pulled. Implementations must
    /// not call back into the registry from here.
    fn notify_update(&self, address: u16, code: u32);
}

/// Observes packets on the transmit path.
///
/// Runs on the hot path for every packet: no blocking, no logging at normal
/// verbosity.
pub trait PacketObserver {
    /// Called once per transmitted packet.
    fn observe(&self, packet: &DccPacket);
}

impl<T: PacketObserver + ?Sized> PacketObserver for Arc<T> {
    fn observe(&self, packet: &DccPacket) {
        (**self).observe(packet)
    }
}
