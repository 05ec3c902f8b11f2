//! Error type shared by the turnout registry and its helpers.

extern crate alloc;

use alloc::string::String;

/// Everything that can go wrong while managing turnouts.
///
/// None of these are fatal: the registry stays usable after any of them.
/// Undecodable packets seen on the track bus are not errors at all; the
/// decoder returns `None` and the packet is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnoutError {
    /// Address outside 1..=2044.
    #[error("turnout address {0} is outside 1..=2044")]
    InvalidAddress(u16),

    /// No turnout at this address (and create-on-demand is disabled).
    #[error("turnout {0} not found")]
    NotFound(u16),

    /// The requested address already belongs to another turnout.
    #[error("turnout address {0} is already in use")]
    AddressInUse(u16),

    /// An event ID token could not be parsed.
    #[error("invalid event id '{0}'")]
    InvalidEventId(String),

    /// Reading or writing the persisted document failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The persisted document could not be parsed or rendered.
    #[error("invalid turnout document: {0}")]
    Json(String),
}

impl From<serde_json::Error> for TurnoutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(alloc::format!("{}", err))
    }
}
