//! OpenLCB network abstractions.
//!
//! Only the event layer is modelled: turnouts bound to the network produce
//! event reports, and the station answers "identify consumer" queries for
//! the DCC accessory event ranges. Transport and node management belong to
//! the OpenLCB stack.

use crate::events::EventId;

/// Produces OpenLCB event reports on behalf of turnouts.
///
/// Called after the registry lock is released, once per configured event,
/// in list order. Implementations should queue and return quickly.
pub trait EventSink {
    /// Emit a single event report.
    fn send_event(&self, event: EventId);
}

/// Answer to an identify-consumer query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EventState {
    /// The queried event matches the current state.
    Valid,
    /// The queried event names the opposite state.
    Invalid,
    /// State not known (e.g. no such turnout).
    #[default]
    Unknown,
}

impl EventState {
    /// Maps a state comparison to [`EventState::Valid`] / [`EventState::Invalid`].
    pub fn from_match(matches: bool) -> Self {
        if matches {
            Self::Valid
        } else {
            Self::Invalid
        }
    }
}
