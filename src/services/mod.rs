//! Network services around the turnout registry.
//!
//! - `web` feature: Axum-based REST API under `/turnouts`
//!
//! Services share the registry through an `Arc`, the same handle the
//! packet snoop and the persistence task hold:
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_turnouts::services::{build_router, WebServerConfig};
//!
//! let registry = Arc::new(TurnoutRegistry::load(config, storage, events, scheduler));
//! let router = build_router(Arc::clone(&registry), &WebServerConfig::default());
//! ```

pub mod api;
pub mod web;

pub use api::*;
pub use web::*;
