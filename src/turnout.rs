//! The turnout entity and its persisted JSON form.
//!
//! A [`Turnout`] is bound either to the rails or to the OpenLCB network,
//! chosen once when it is created:
//!
//! - [`TurnoutBinding::Dcc`]: state changes are sent as DCC basic accessory
//!   packets. The turnout asks the track layer for a refresh slot and later
//!   supplies the packet through [`Turnout::next_packet`].
//! - [`TurnoutBinding::OpenLcb`]: state changes are announced by producing
//!   the configured closed/thrown event IDs.
//!
//! State changes never perform the notification themselves; they return a
//! [`Notification`] which the registry dispatches once its lock is released.
//!
//! # JSON
//!
//! ```json
//! {"address":5,"id":5,"type":0,"state":0}
//! {"address":12,"id":12,"type":2,"openlcb":{"closed":"0x0102030405060708","thrown":"0x0102030405060709"},"state":1}
//! ```

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{is_valid_address, next_packet};
use crate::error::TurnoutError;
use crate::events::{format_event_list, parse_event_list, EventId};
use crate::packet::DccPacket;

/// Refresh code asking the track layer for the turnout's state packet.
///
/// Code `0` is the generic refresh and yields an idle packet.
pub const ACCESSORY_UPDATE_CODE: u32 = 1;

// ============================================================================
// Turnout Type / State
// ============================================================================

/// Physical shape of a turnout. Metadata for user interfaces only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TurnoutType {
    /// Diverges to the left.
    #[default]
    Left = 0,
    /// Diverges to the right.
    Right = 1,
    /// Symmetric wye.
    Wye = 2,
    /// Multi-way (e.g. three-way or slip).
    Multi = 3,
    /// Not known.
    Unknown = 4,
}

impl TurnoutType {
    /// Maps the persisted integer to a type, `None` if out of range.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Left),
            1 => Some(Self::Right),
            2 => Some(Self::Wye),
            3 => Some(Self::Multi),
            4 => Some(Self::Unknown),
            _ => None,
        }
    }

    /// The persisted integer.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Upper case label used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Wye => "WYE",
            Self::Multi => "MULTI",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TurnoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commanded position of a turnout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TurnoutState {
    /// Straight through (`false` on the wire).
    #[default]
    Closed,
    /// Diverging (`true` on the wire).
    Thrown,
}

impl TurnoutState {
    /// `true` maps to [`TurnoutState::Thrown`].
    pub fn from_thrown(thrown: bool) -> Self {
        if thrown {
            Self::Thrown
        } else {
            Self::Closed
        }
    }

    /// Whether this is [`TurnoutState::Thrown`].
    pub fn is_thrown(self) -> bool {
        self == Self::Thrown
    }

    /// The opposite state.
    pub fn toggled(self) -> Self {
        Self::from_thrown(!self.is_thrown())
    }

    /// Readable token used in JSON (`"CLOSED"` / `"THROWN"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Thrown => "THROWN",
        }
    }
}

impl fmt::Display for TurnoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Turnout Entity
// ============================================================================

/// How a turnout reports state changes. Fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnoutBinding {
    /// Driven by DCC accessory packets on the rails.
    Dcc,
    /// Mirrored onto the OpenLCB network as event reports.
    OpenLcb {
        /// Produced when the turnout becomes closed.
        closed_events: Vec<EventId>,
        /// Produced when the turnout becomes thrown.
        thrown_events: Vec<EventId>,
    },
}

/// Side effect a state change asks the caller to carry out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Queue a packet refresh for this DCC turnout.
    Refresh {
        /// Turnout address to refresh.
        address: u16,
        /// Refresh code to hand back to [`Turnout::next_packet`].
        code: u32,
    },
    /// Produce these events on the network, in order.
    Events(Vec<EventId>),
}

/// A single turnout: identity, metadata, state and binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turnout {
    address: u16,
    id: u16,
    kind: TurnoutType,
    state: TurnoutState,
    binding: TurnoutBinding,
}

impl Turnout {
    /// Creates a rail-bound turnout. `id` defaults to the address.
    pub fn dcc(address: u16, id: Option<u16>, thrown: bool, kind: TurnoutType) -> Self {
        Self {
            address,
            id: effective_id(address, id),
            kind,
            state: TurnoutState::from_thrown(thrown),
            binding: TurnoutBinding::Dcc,
        }
    }

    /// Creates a network-bound turnout.
    pub fn openlcb(
        address: u16,
        id: Option<u16>,
        closed_events: Vec<EventId>,
        thrown_events: Vec<EventId>,
        thrown: bool,
        kind: TurnoutType,
    ) -> Self {
        Self {
            address,
            id: effective_id(address, id),
            kind,
            state: TurnoutState::from_thrown(thrown),
            binding: TurnoutBinding::OpenLcb {
                closed_events,
                thrown_events,
            },
        }
    }

    /// DCC accessory address (1..=2044).
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Stable identifier exposed to throttles and other clients.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Physical shape.
    pub fn kind(&self) -> TurnoutType {
        self.kind
    }

    /// Commanded position.
    pub fn state(&self) -> TurnoutState {
        self.state
    }

    /// Shorthand for `state().is_thrown()`.
    pub fn is_thrown(&self) -> bool {
        self.state.is_thrown()
    }

    /// The notification mechanism.
    pub fn binding(&self) -> &TurnoutBinding {
        &self.binding
    }

    /// Whether this turnout reports through OpenLCB events.
    pub fn is_openlcb(&self) -> bool {
        matches!(self.binding, TurnoutBinding::OpenLcb { .. })
    }

    /// Events produced on close; empty for DCC turnouts.
    pub fn closed_events(&self) -> &[EventId] {
        match &self.binding {
            TurnoutBinding::OpenLcb { closed_events, .. } => closed_events,
            TurnoutBinding::Dcc => &[],
        }
    }

    /// Events produced on throw; empty for DCC turnouts.
    pub fn thrown_events(&self) -> &[EventId] {
        match &self.binding {
            TurnoutBinding::OpenLcb { thrown_events, .. } => thrown_events,
            TurnoutBinding::Dcc => &[],
        }
    }

    /// Sets the state unconditionally.
    ///
    /// With `notify` the returned [`Notification`] tells the caller what to
    /// send: a refresh request for DCC turnouts, the matching event list for
    /// OpenLCB turnouts. Returns `None` without `notify`, or when an OpenLCB
    /// turnout has no events configured for the new state.
    pub fn set(&mut self, thrown: bool, notify: bool) -> Option<Notification> {
        self.state = TurnoutState::from_thrown(thrown);
        if !notify {
            return None;
        }
        match &self.binding {
            TurnoutBinding::Dcc => Some(Notification::Refresh {
                address: self.address,
                code: ACCESSORY_UPDATE_CODE,
            }),
            TurnoutBinding::OpenLcb {
                closed_events,
                thrown_events,
            } => {
                let events = if thrown { thrown_events } else { closed_events };
                (!events.is_empty()).then(|| Notification::Events(events.clone()))
            }
        }
    }

    /// Flips the state, see [`Turnout::set`].
    pub fn toggle(&mut self, notify: bool) -> Option<Notification> {
        self.set(!self.is_thrown(), notify)
    }

    /// Packet for a refresh slot granted by the track layer.
    ///
    /// Code `0` yields an idle packet, anything else the accessory packet for
    /// the current state. OpenLCB turnouts never transmit and return `None`.
    pub fn next_packet(&self, code: u32) -> Option<DccPacket> {
        match self.binding {
            TurnoutBinding::OpenLcb { .. } => None,
            TurnoutBinding::Dcc if code == 0 => Some(DccPacket::idle()),
            TurnoutBinding::Dcc => Some(next_packet(self.address, self.is_thrown())),
        }
    }

    /// Updates identity and type in place.
    ///
    /// `kind: None` keeps the current type; `id: None` resets the id to the
    /// (new) address. The binding is never changed.
    pub fn update(&mut self, address: u16, kind: Option<TurnoutType>, id: Option<u16>) {
        self.address = address;
        if let Some(kind) = kind {
            self.kind = kind;
        }
        self.id = effective_id(address, id);
    }

    /// Replaces the event lists of an OpenLCB turnout.
    ///
    /// Returns `false` (and changes nothing) for DCC turnouts.
    pub fn set_events(&mut self, closed: Vec<EventId>, thrown: Vec<EventId>) -> bool {
        match &mut self.binding {
            TurnoutBinding::OpenLcb {
                closed_events,
                thrown_events,
            } => {
                *closed_events = closed;
                *thrown_events = thrown;
                true
            }
            TurnoutBinding::Dcc => false,
        }
    }

    /// Persisted/API representation. `readable` renders the state as a
    /// token instead of `0`/`1`.
    pub fn to_record(&self, readable: bool) -> TurnoutRecord {
        let state = if readable {
            StateValue::Text(String::from(self.state.as_str()))
        } else {
            StateValue::Number(u64::from(self.is_thrown()))
        };
        let openlcb = match &self.binding {
            TurnoutBinding::Dcc => None,
            TurnoutBinding::OpenLcb {
                closed_events,
                thrown_events,
            } => Some(OpenLcbRecord {
                closed: format_event_list(closed_events),
                thrown: format_event_list(thrown_events),
            }),
        };
        TurnoutRecord {
            address: i64::from(self.address),
            id: Some(i64::from(self.id)),
            kind: i64::from(self.kind.as_u8()),
            openlcb,
            state,
        }
    }

    /// JSON object for this turnout.
    pub fn to_json(&self, readable: bool) -> String {
        serde_json::to_string(&self.to_record(readable)).unwrap_or_else(|_| String::from("{}"))
    }
}

fn effective_id(address: u16, id: Option<u16>) -> u16 {
    match id {
        Some(id) if id > 0 => id,
        _ => address,
    }
}

// ============================================================================
// Persisted Record
// ============================================================================

/// One element of the persisted turnout array.
///
/// Numeric fields are wide so that out of range values survive parsing and
/// can be rejected with a proper error instead of failing the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurnoutRecord {
    /// DCC accessory address.
    pub address: i64,
    /// Stable identifier, defaults to the address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// [`TurnoutType`] as integer.
    #[serde(rename = "type")]
    pub kind: i64,
    /// Present only for OpenLCB turnouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openlcb: Option<OpenLcbRecord>,
    /// Commanded state.
    pub state: StateValue,
}

/// Event lists of an OpenLCB turnout, as comma separated strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLcbRecord {
    /// Closed events.
    pub closed: String,
    /// Thrown events.
    pub thrown: String,
}

/// The `state` field: `0`/`1`, a boolean, or `"CLOSED"`/`"THROWN"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// `0` closed, anything else thrown.
    Number(u64),
    /// `true` thrown.
    Flag(bool),
    /// Readable token, case-insensitive.
    Text(String),
}

impl StateValue {
    fn is_thrown(&self) -> Result<bool, TurnoutError> {
        match self {
            Self::Number(value) => Ok(*value != 0),
            Self::Flag(flag) => Ok(*flag),
            Self::Text(text) if text.eq_ignore_ascii_case("thrown") => Ok(true),
            Self::Text(text) if text.eq_ignore_ascii_case("closed") => Ok(false),
            Self::Text(text) => Err(TurnoutError::Json(alloc::format!("unknown state '{}'", text))),
        }
    }
}

impl TryFrom<TurnoutRecord> for Turnout {
    type Error = TurnoutError;

    fn try_from(record: TurnoutRecord) -> Result<Self, Self::Error> {
        let address = u16::try_from(record.address)
            .ok()
            .filter(|address| is_valid_address(*address))
            .ok_or(TurnoutError::InvalidAddress(
                record.address.clamp(0, i64::from(u16::MAX)) as u16,
            ))?;
        let id = record.id.and_then(|id| u16::try_from(id).ok());
        let kind = u8::try_from(record.kind)
            .ok()
            .and_then(TurnoutType::from_u8)
            .unwrap_or(TurnoutType::Unknown);
        let thrown = record.state.is_thrown()?;
        Ok(match record.openlcb {
            Some(events) => Turnout::openlcb(
                address,
                id,
                parse_event_list(&events.closed)?,
                parse_event_list(&events.thrown)?,
                thrown,
                kind,
            ),
            None => Turnout::dcc(address, id, thrown, kind),
        })
    }
}
