/**
 * Conversation REST Handlers
 *
 * All routes sit behind `auth_middleware` and read the caller through the
 * `AuthUser` extractor.
 *
 * # Routes
 *
 * - `GET /api/chat/conversation/user/{userId}` - get or create the one-on-one conversation
 * - `GET /api/chat/conversations` - the caller's active conversations
 * - `GET /api/chat/conversation/{conversationId}` - one conversation
 * - `GET /api/chat/conversation/{conversationId}/messages` - paged history
 */

use std::collections::HashMap;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::backend::error::ChatError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::backend::store::ChatStore;
use crate::shared::messaging::{
    Conversation, ConversationResponse, ConversationView, ListConversationsResponse,
    ListMessagesResponse, MessageView, Pagination, UserProfile,
};

const DEFAULT_PAGE_LIMIT: u32 = 50;
const MAX_PAGE_LIMIT: u32 = 100;
const INTERNAL: &str = "Internal server error";

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn parse_path_id(raw: &str, field: &str) -> Result<Uuid, ChatError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ChatError::invalid_payload(format!("Invalid {}", field)))
}

/// Profiles keyed by id for the given users
async fn profiles(
    store: &dyn ChatStore,
    ids: Vec<Uuid>,
) -> Result<HashMap<Uuid, UserProfile>, ChatError> {
    let mut ids = ids;
    ids.sort();
    ids.dedup();
    let users = store
        .find_users(&ids)
        .await
        .map_err(|e| ChatError::persistence(INTERNAL, e))?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

fn view_for(
    conversation: Conversation,
    caller: Uuid,
    profiles: &HashMap<Uuid, UserProfile>,
) -> ConversationView {
    let other_user = conversation
        .other_participant(caller)
        .and_then(|id| profiles.get(&id).cloned());
    ConversationView {
        conversation,
        other_user,
    }
}

/// Load a conversation the caller participates in
async fn load_for_participant(
    store: &dyn ChatStore,
    raw_id: &str,
    caller: Uuid,
) -> Result<Conversation, ChatError> {
    let conversation_id = parse_path_id(raw_id, "conversationId")?;
    let conversation = store
        .find_conversation(conversation_id)
        .await
        .map_err(|e| ChatError::persistence(INTERNAL, e))?
        .ok_or(ChatError::ConversationNotFound)?;
    if !conversation.has_participant(caller) {
        return Err(ChatError::Unauthorized);
    }
    Ok(conversation)
}

/// Get or create the conversation with another user
/// (GET /api/chat/conversation/user/{user_id})
pub async fn get_or_create_conversation(
    State(app_state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(other_user_id): Path<String>,
) -> Result<Json<ConversationResponse>, ChatError> {
    let store = app_state.store.as_ref();
    let other = parse_path_id(&other_user_id, "userId")?;
    if other == caller.user_id {
        return Err(ChatError::invalid_payload(
            "Cannot create conversation with yourself",
        ));
    }

    let friends = store
        .are_friends(caller.user_id, other)
        .await
        .map_err(|e| ChatError::persistence(INTERNAL, e))?;
    if !friends {
        return Err(ChatError::FriendshipRequired("start a conversation"));
    }

    let lookup = store
        .find_or_create_conversation(caller.user_id, other)
        .await
        .map_err(|e| ChatError::persistence(INTERNAL, e))?;
    if lookup.created {
        tracing::info!(
            conversation_id = %lookup.conversation.id,
            created_by = %caller.user_id,
            "Conversation created"
        );
    }

    let profiles = profiles(store, vec![other]).await?;
    Ok(Json(ConversationResponse {
        conversation: view_for(lookup.conversation, caller.user_id, &profiles),
        message: Some("Conversation retrieved successfully".to_string()),
    }))
}

/// List the caller's active conversations (GET /api/chat/conversations)
pub async fn list_conversations(
    State(app_state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<ListConversationsResponse>, ChatError> {
    let store = app_state.store.as_ref();
    let conversations = store
        .list_conversations(caller.user_id)
        .await
        .map_err(|e| ChatError::persistence(INTERNAL, e))?;

    let others = conversations
        .iter()
        .filter_map(|c| c.other_participant(caller.user_id))
        .collect();
    let profiles = profiles(store, others).await?;

    let conversations: Vec<ConversationView> = conversations
        .into_iter()
        .map(|c| view_for(c, caller.user_id, &profiles))
        .collect();
    Ok(Json(ListConversationsResponse {
        count: conversations.len(),
        conversations,
    }))
}

/// Get one conversation (GET /api/chat/conversation/{conversation_id})
pub async fn get_conversation(
    State(app_state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationResponse>, ChatError> {
    let store = app_state.store.as_ref();
    let conversation = load_for_participant(store, &conversation_id, caller.user_id).await?;

    let others = conversation.other_participant(caller.user_id).into_iter().collect();
    let profiles = profiles(store, others).await?;
    Ok(Json(ConversationResponse {
        conversation: view_for(conversation, caller.user_id, &profiles),
        message: None,
    }))
}

/// Page through a conversation's history
/// (GET /api/chat/conversation/{conversation_id}/messages?page&limit)
///
/// Pages count back from the newest message; each page is returned oldest
/// first. Fetching history updates the caller's last-read time.
pub async fn get_messages(
    State(app_state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(conversation_id): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<ListMessagesResponse>, ChatError> {
    let Query(params) =
        params.map_err(|_| ChatError::invalid_payload("Invalid pagination parameters"))?;
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    if page == 0 {
        return Err(ChatError::invalid_payload("page must be at least 1"));
    }
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(ChatError::invalid_payload(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }

    let store = app_state.store.as_ref();
    let conversation = load_for_participant(store, &conversation_id, caller.user_id).await?;

    let offset = u64::from(page - 1) * u64::from(limit);
    let (mut messages, total) = store
        .messages_page(conversation.id, limit, offset)
        .await
        .map_err(|e| ChatError::persistence(INTERNAL, e))?;
    messages.reverse();

    let senders = profiles(store, messages.iter().map(|m| m.sender_id).collect()).await?;
    let messages = messages
        .into_iter()
        .map(|m| {
            let sender = senders
                .get(&m.sender_id)
                .cloned()
                .unwrap_or_else(|| UserProfile::unknown(m.sender_id));
            MessageView::new(m, sender)
        })
        .collect();

    if let Err(e) = store
        .mark_conversation_read(conversation.id, caller.user_id, Utc::now())
        .await
    {
        tracing::warn!(
            conversation_id = %conversation.id,
            user_id = %caller.user_id,
            "Failed to update last read: {}",
            e
        );
    }

    Ok(Json(ListMessagesResponse {
        messages,
        pagination: Pagination { page, limit, total },
    }))
}

/// Liveness check (GET /health)
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
