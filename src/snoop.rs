//! Keeps the registry in sync with accessory packets seen on the rails.
//!
//! Other DCC equipment on the same bus (a handheld throttle, a second
//! booster) can command turnouts the station did not. [`AccessorySnoop`]
//! is registered as a [`PacketObserver`] on the transmit path, decodes every
//! basic accessory packet and passively updates the matching turnout.

use std::sync::Arc;

use log::trace;

use crate::codec::decode_accessory_packet;
use crate::packet::DccPacket;
use crate::registry::TurnoutRegistry;
use crate::traits::{EventSink, PacketObserver, PacketScheduler, Storage};

/// Packet observer feeding decoded accessory commands into the registry.
pub struct AccessorySnoop<S, E, P> {
    registry: Arc<TurnoutRegistry<S, E, P>>,
}

impl<S, E, P> AccessorySnoop<S, E, P> {
    /// Creates a snoop for `registry`.
    pub fn new(registry: Arc<TurnoutRegistry<S, E, P>>) -> Self {
        Self { registry }
    }

    /// The registry this snoop updates.
    pub fn registry(&self) -> &Arc<TurnoutRegistry<S, E, P>> {
        &self.registry
    }
}

impl<S: Storage, E: EventSink, P: PacketScheduler> PacketObserver for AccessorySnoop<S, E, P> {
    fn observe(&self, packet: &DccPacket) {
        let Some(command) = decode_accessory_packet(packet) else {
            return;
        };
        trace!(
            "[Turnout {} {}:{}] Snooped {}",
            command.address,
            command.board,
            command.port,
            if command.thrown { "THROWN" } else { "CLOSED" }
        );
        // The packet is already on the wire: never schedule it again.
        if let Err(err) = self.registry.set(command.address, command.thrown, false) {
            trace!("[Turnout {}] Snooped packet ignored: {}", command.address, err);
        }
    }
}
