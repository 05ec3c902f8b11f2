//! Implementations of the collaborator traits in [`crate::traits`].
//!
//! # Available Implementations
//!
//! - `mock`: recording test doubles for every trait
//! - `file`: crash-safe file storage for desktop stations

pub mod file;
pub mod mock;

pub use file::*;
pub use mock::*;
