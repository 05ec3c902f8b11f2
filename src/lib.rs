//! # rs-turnouts
//!
//! The turnout (DCC accessory decoder) subsystem of a model railroad
//! command station.
//!
//! ## Features
//!
//! - **Address codec**: user turnout addresses (1..=2044) to the DCC board/port
//!   wire format and back, including decoding packets seen on the rails
//! - **Two bindings**: DCC turnouts drive accessory packets, OpenLCB turnouts
//!   mirror their state as network events
//! - **Thread-safe registry**: one lock, notifications sent after release
//! - **Debounced persistence**: a periodic task writes the registry only when
//!   it changed, with a final flush at shutdown
//! - **Packet snoop**: turnouts commanded by other equipment on the bus stay
//!   in sync
//! - **REST API** (feature `web`)
//!
//! ## Architecture
//!
//! - `codec`, `packet`, `events` - wire formats (`no_std`)
//! - `turnout` - the turnout entity and its JSON record
//! - `traits` - storage, network and track abstractions
//! - `registry` - the shared turnout collection
//! - `snoop`, `consumer` - passive inputs from the rails and the network
//! - `persist` - periodic persistence task
//! - `hal` - concrete implementations (mock for testing, file storage)
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use rs_turnouts::{
//!     config::TurnoutConfig,
//!     hal::{MockEventSink, MockScheduler, MockStorage},
//!     TurnoutRegistry, TurnoutType,
//! };
//!
//! let registry = Arc::new(TurnoutRegistry::load(
//!     TurnoutConfig::default(),
//!     MockStorage::new(),
//!     MockEventSink::new(),
//!     MockScheduler::new(),
//! ));
//!
//! // Register a turnout and throw it
//! registry.create_or_update_dcc(10, Some(TurnoutType::Right), None).unwrap();
//! let status = registry.set(10, true, true).unwrap();
//! assert_eq!(status.to_string(), "<H 10 1>");
//!
//! // The track layer pulls the packet when it has bandwidth
//! let packet = registry.next_packet(10, 1).unwrap();
//! assert_eq!(packet.payload(), &[0x82, 0xFB]);
//!
//! // Flush to storage
//! assert!(registry.persist().unwrap());
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Address conversion between user numbering and the DCC accessory wire format.
pub mod codec;
/// Shared configuration for the registry and the web server.
pub mod config;
/// Legacy DCC++ style text responses.
pub mod dccpp;
/// Error taxonomy for registry operations.
pub mod error;
/// OpenLCB event identifiers and the DCC accessory event ranges.
pub mod events;
/// DCC packet representation.
pub mod packet;
/// Collaborator traits: storage, OpenLCB events, track output.
pub mod traits;
/// The turnout entity.
pub mod turnout;

/// OpenLCB DCC accessory event consumer.
#[cfg(feature = "std")]
pub mod consumer;
/// Mock and file-backed implementations of the collaborator traits.
#[cfg(feature = "std")]
pub mod hal;
/// The shared turnout registry.
#[cfg(feature = "std")]
pub mod registry;
/// Packet snoop keeping the registry in sync with the rails.
#[cfg(feature = "std")]
pub mod snoop;

/// Periodic persistence task (tokio).
#[cfg(feature = "timer")]
pub mod persist;

/// REST API (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use codec::{
    decode, decode_accessory_packet, encode, AccessoryCommand, MAX_ADDRESS, MIN_ADDRESS,
};
pub use config::{Config, TurnoutConfig, WebConfig};
pub use dccpp::{TurnoutStatus, COMMAND_FAILED_RESPONSE};
pub use error::TurnoutError;
pub use events::EventId;
pub use packet::DccPacket;
pub use traits::{EventSink, EventState, PacketObserver, PacketScheduler, Storage};
pub use turnout::{Turnout, TurnoutBinding, TurnoutState, TurnoutType};

#[cfg(feature = "std")]
pub use consumer::AccessoryEventConsumer;
#[cfg(feature = "std")]
pub use registry::TurnoutRegistry;
#[cfg(feature = "std")]
pub use snoop::AccessorySnoop;

#[cfg(feature = "timer")]
pub use persist::PersistenceTask;
