//! Persisted document storage.
//!
//! The registry persists one JSON document under a configurable key. On the
//! command station that is a file on the flash filesystem; on desktop it is
//! a file on disk ([`crate::hal::FileStorage`]).

use core::fmt;

extern crate alloc;
use alloc::string::String;

/// Named text document storage.
///
/// Implementations must make [`Storage::store`] atomic with respect to power
/// loss where the medium allows it: after a failure either the old or the
/// new document is readable, never a mix.
///
/// Methods take `&self`; implementations that need mutation use interior
/// locking because the registry calls them from its persistence task.
pub trait Storage {
    /// Error type for storage operations.
    type Error: fmt::Display + fmt::Debug;

    /// Reads the document stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    fn load(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Replaces the document stored under `key`.
    fn store(&self, key: &str, contents: &str) -> Result<(), Self::Error>;
}
