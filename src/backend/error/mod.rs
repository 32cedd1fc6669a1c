//! Backend Error Module
//!
//! Error types raised by the connection gate, the chat event handlers and the
//! REST endpoints.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and wire payload conversion
//! ```
//!
//! # Error Reporting
//!
//! Every `ChatError` renders as the same `{error: <message>}` shape. Over
//! the socket it travels inside an `error` or `messageError` event. Over
//! HTTP it becomes a JSON body with the matching status code.

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::ChatError;
