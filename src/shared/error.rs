//! Shared Error Types
//!
//! Errors raised while decoding and validating wire data, before any
//! backend handler runs.
//!
//! # Error Categories
//!
//! - `SerializationError` - a frame or payload is not valid JSON for its shape
//! - `ValidationError` - a field is missing or malformed
//! - `UnknownEvent` - a client named an event the server does not handle
//!
//! # Usage
//!
//! ```rust
//! use linkup::shared::error::SharedError;
//!
//! let error = SharedError::validation("conversationId", "Invalid conversationId");
//! ```
use thiserror::Error;

/// Errors produced while decoding wire data
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },

    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    #[error("Unknown event: {event}")]
    UnknownEvent { event: String },
}

impl SharedError {
    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unknown_event(event: impl Into<String>) -> Self {
        Self::UnknownEvent {
            event: event.into(),
        }
    }
}

impl From<serde_json::Error> for SharedError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
