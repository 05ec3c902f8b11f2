//! Trait definitions for the collaborators around the turnout registry.
//!
//! The registry owns turnout state; everything it talks to is behind a trait
//! so the same code runs against real storage and transports or against the
//! recording doubles in [`crate::hal::mock`].
//!
//! # Submodules
//!
//! - `storage`: persisted document load/store
//! - `network`: OpenLCB event production and consumer identification
//! - `track`: DCC packet refresh scheduling and the packet snoop hook
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Storage`] | Named document storage (flash file, disk file) |
//! | [`EventSink`] | Produces OpenLCB event reports |
//! | [`PacketScheduler`] | Asks the track layer for a refresh slot |
//! | [`PacketObserver`] | Sees every packet put on the rails |

pub mod network;
pub mod storage;
pub mod track;

pub use network::*;
pub use storage::*;
pub use track::*;
