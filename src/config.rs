//! Station configuration for the turnout subsystem.
//!
//! Uses `heapless::String` so the same types work on the command station
//! without an allocator and on desktop with `std`.
//!
//! # Example
//!
//! ```rust
//! use rs_turnouts::config::{Config, TurnoutConfig, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.turnouts.storage_key.as_str(), "turnouts.json");
//!
//! // Or customize
//! let config = Config::default()
//!     .with_turnouts(TurnoutConfig::default().with_create_on_demand(true))
//!     .with_web(WebConfig::default().with_port(3000));
//! ```

use core::time::Duration;

use heapless::String as HString;

/// Maximum length for short config strings (storage keys, names)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating at a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut end = s.len().min(MAX_SHORT_STRING);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut hs = ShortString::new();
    let _ = hs.push_str(&s[..end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete configuration of the turnout subsystem
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Registry and persistence configuration
    pub turnouts: TurnoutConfig,
    /// Web server configuration
    pub web: WebConfig,
}

impl Config {
    /// Set turnout configuration
    pub fn with_turnouts(mut self, turnouts: TurnoutConfig) -> Self {
        self.turnouts = turnouts;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }
}

// ============================================================================
// Turnout Config
// ============================================================================

/// Turnout registry configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnoutConfig {
    /// Storage key of the persisted turnout document
    pub storage_key: ShortString,
    /// Create a plain DCC turnout when an unknown address is commanded
    pub create_on_demand: bool,
    /// Seconds between persistence checks
    pub persistence_interval_secs: u32,
    /// Repeat count stamped on every accessory packet
    pub packet_repeats: u8,
}

impl Default for TurnoutConfig {
    fn default() -> Self {
        Self {
            storage_key: short_string("turnouts.json"),
            create_on_demand: false,
            persistence_interval_secs: 30,
            packet_repeats: 3,
        }
    }
}

impl TurnoutConfig {
    /// Set the storage key
    pub fn with_storage_key(mut self, key: &str) -> Self {
        self.storage_key = short_string(key);
        self
    }

    /// Enable or disable create-on-demand
    pub fn with_create_on_demand(mut self, enabled: bool) -> Self {
        self.create_on_demand = enabled;
        self
    }

    /// Set the persistence interval (at least one second)
    pub fn with_persistence_interval_secs(mut self, secs: u32) -> Self {
        self.persistence_interval_secs = secs.max(1);
        self
    }

    /// Set the packet repeat count
    pub fn with_packet_repeats(mut self, repeats: u8) -> Self {
        self.packet_repeats = repeats;
        self
    }

    /// Persistence interval as a `Duration`
    pub fn persistence_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.persistence_interval_secs.max(1)))
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether web server is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable web server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
