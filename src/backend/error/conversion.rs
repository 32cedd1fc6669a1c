/**
 * Error Conversion
 *
 * `ChatError` converts into an HTTP response for the REST endpoints and into
 * an `ErrorPayload` for socket events.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Conversation not found",
 *   "status": 404
 * }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::backend::error::types::ChatError;
use crate::shared::event::ErrorPayload;

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ChatError::PersistenceFailure { context, source } = &self {
            tracing::error!("{}: {}", context, source);
        }

        let body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

impl From<&ChatError> for ErrorPayload {
    fn from(err: &ChatError) -> Self {
        ErrorPayload::new(err.message())
    }
}
