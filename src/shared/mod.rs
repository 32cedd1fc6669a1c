//! Shared Module
//!
//! Types shared by the chat server and its clients: the domain records, the
//! WebSocket event protocol, configuration, and decoding errors. Nothing here
//! depends on the server stack, so the module builds without the `server`
//! feature.

/// Real-time event protocol
pub mod event;

/// Shared error types
pub mod error;

/// Server configuration
pub mod config;

/// Conversations, messages and user profiles
pub mod messaging;

/// Re-export commonly used types for convenience
pub use config::{ChatConfig, ChatConfigBuilder, ConfigError};
pub use error::SharedError;
pub use event::{ClientEvent, ClientFrame, ServerEvent};
