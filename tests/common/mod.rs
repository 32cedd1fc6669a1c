//! Common test utilities and helpers
//!
//! - `TestChat`, an application state over an in-memory store
//! - user and friendship seeding
//! - token minting and socket-less connections

#[cfg(feature = "server")]
pub mod harness;

#[cfg(feature = "server")]
pub use harness::*;
