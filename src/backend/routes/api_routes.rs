/**
 * API Route Handlers
 *
 * Conversation and history endpoints, mounted under `/api/chat`.
 *
 * # Routes
 *
 * - `GET /conversations` - the caller's active conversations
 * - `GET /conversation/user/{user_id}` - get or create a conversation with a friend
 * - `GET /conversation/{conversation_id}` - one conversation
 * - `GET /conversation/{conversation_id}/messages` - paged history
 *
 * # Authentication
 *
 * Every route requires a bearer token. The check is applied as a route
 * layer so unmatched paths still answer 404 rather than 401.
 */

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::backend::messaging::handlers::{
    get_conversation, get_messages, get_or_create_conversation, list_conversations,
};
use crate::backend::middleware::auth_middleware;
use crate::backend::server::state::AppState;

/// Build the `/api/chat` sub-router
pub fn configure_api_routes(app_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/conversations", get(list_conversations))
        .route(
            "/conversation/user/{user_id}",
            get(get_or_create_conversation),
        )
        .route("/conversation/{conversation_id}", get(get_conversation))
        .route(
            "/conversation/{conversation_id}/messages",
            get(get_messages),
        )
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware))
}
