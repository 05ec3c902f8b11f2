//! Consumer for the well-known OpenLCB DCC accessory events.
//!
//! OpenLCB reserves two 4096-event ranges for basic DCC accessories, one
//! for "activate" and one for "inactivate". The event offset within a range
//! is the accessory output address, so each turnout owns two events per
//! range (closed and thrown):
//!
//! ```text
//! 01.01.02.00.00.FF.0x.xx   activate    -> set(address, state), send DCC
//! 01.01.02.00.00.FE.0x.xx   inactivate  -> set(address, state), passive
//! ```

use std::sync::Arc;

use log::debug;

use crate::events::{
    decode_accessory_event, EventId, ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE,
    DCC_ACCESSORY_EVENT_COUNT, INACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE,
};
use crate::dccpp::TurnoutStatus;
use crate::error::TurnoutError;
use crate::registry::TurnoutRegistry;
use crate::traits::{EventSink, EventState, PacketScheduler, Storage};

/// A contiguous range of consumed events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventRange {
    /// First event in the range.
    pub base: EventId,
    /// Number of events.
    pub count: u64,
}

impl EventRange {
    /// Whether `event` falls inside this range.
    pub fn contains(&self, event: EventId) -> bool {
        event
            .value()
            .checked_sub(self.base.value())
            .is_some_and(|offset| offset < self.count)
    }
}

/// Routes DCC accessory events from the network into the registry.
pub struct AccessoryEventConsumer<S, E, P> {
    registry: Arc<TurnoutRegistry<S, E, P>>,
}

impl<S: Storage, E: EventSink, P: PacketScheduler> AccessoryEventConsumer<S, E, P> {
    /// Creates a consumer for `registry`.
    pub fn new(registry: Arc<TurnoutRegistry<S, E, P>>) -> Self {
        Self { registry }
    }

    /// Ranges to advertise in identify-global replies.
    pub fn consumed_ranges(&self) -> [EventRange; 2] {
        [
            EventRange {
                base: EventId(ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE),
                count: DCC_ACCESSORY_EVENT_COUNT,
            },
            EventRange {
                base: EventId(INACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE),
                count: DCC_ACCESSORY_EVENT_COUNT,
            },
        ]
    }

    /// Handles a producer/consumer event report.
    ///
    /// Returns `None` for events outside both ranges, otherwise the registry
    /// result of the resulting `set`.
    pub fn handle_event_report(
        &self,
        event: EventId,
    ) -> Option<Result<TurnoutStatus, TurnoutError>> {
        let accessory = decode_accessory_event(event)?;
        debug!(
            "[Turnout {}] Event {} ({}, {})",
            accessory.address,
            event,
            if accessory.activate { "activate" } else { "inactivate" },
            if accessory.thrown { "THROWN" } else { "CLOSED" }
        );
        Some(
            self.registry
                .set(accessory.address, accessory.thrown, accessory.activate),
        )
    }

    /// Answers an identify-consumer query.
    ///
    /// `None` for foreign events; [`EventState::Unknown`] when there is no
    /// turnout at the address; otherwise whether the turnout's state matches
    /// the state the event names.
    pub fn identify_consumer(&self, event: EventId) -> Option<EventState> {
        let accessory = decode_accessory_event(event)?;
        Some(match self.registry.get(accessory.address) {
            Some(turnout) => EventState::from_match(turnout.is_thrown() == accessory.thrown),
            None => EventState::Unknown,
        })
    }
}
