/**
 * Chat Error Types
 *
 * # Error Categories
 *
 * ## Gate Errors
 *
 * Raised while admitting a connection: missing or invalid credential, or a
 * credential naming a user that no longer exists. The connection is refused.
 *
 * ## Request Errors
 *
 * Raised while handling one event or request: malformed payloads, unknown
 * conversations, non-participants, non-friends. The connection stays open.
 *
 * ## Persistence Errors
 *
 * Store failures. The underlying error is logged and the client only sees
 * the action-specific summary.
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::store::StoreError;
use crate::shared::SharedError;

/// Errors surfaced to chat clients
#[derive(Debug, Error)]
pub enum ChatError {
    /// No credential was presented
    #[error("Authentication required")]
    AuthenticationRequired,

    /// The credential failed verification
    #[error("Invalid token")]
    InvalidCredential,

    /// The credential names a user that does not exist
    #[error("User not found")]
    UserNotFound,

    /// A required field is missing or malformed
    ///
    /// The message is client-facing, e.g. "Invalid conversationId".
    #[error("{0}")]
    InvalidPayload(String),

    #[error("Conversation not found")]
    ConversationNotFound,

    /// The caller is not allowed to act on the resource
    #[error("Unauthorized")]
    Unauthorized,

    /// The two participants are no longer friends
    #[error("You must be friends to {0}")]
    FriendshipRequired(&'static str),

    /// A store operation failed while performing an action
    ///
    /// `context` is the client-facing summary, e.g. "Failed to send message".
    #[error("{context}")]
    PersistenceFailure {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ChatError {
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload(message.into())
    }

    /// Wrap a store error with the client-facing summary of the failed action
    pub fn persistence(context: &'static str, source: StoreError) -> Self {
        Self::PersistenceFailure { context, source }
    }

    /// Whether this error should refuse the connection
    pub fn is_gate_error(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationRequired | Self::InvalidCredential | Self::UserNotFound
        )
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - gate errors - 401 Unauthorized
    /// - `InvalidPayload` - 400 Bad Request
    /// - `ConversationNotFound` - 404 Not Found
    /// - `Unauthorized`, `FriendshipRequired` - 403 Forbidden
    /// - `PersistenceFailure` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired | Self::InvalidCredential | Self::UserNotFound => {
                StatusCode::UNAUTHORIZED
            }
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::ConversationNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::FriendshipRequired(_) => StatusCode::FORBIDDEN,
            Self::PersistenceFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; never includes store internals
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<SharedError> for ChatError {
    fn from(err: SharedError) -> Self {
        match err {
            SharedError::ValidationError { message, .. } => Self::InvalidPayload(message),
            SharedError::SerializationError { .. } | SharedError::UnknownEvent { .. } => {
                Self::invalid_payload("Invalid payload")
            }
        }
    }
}
