//! REST API and handshake tests

use axum::http::StatusCode;
use linkup::backend::store::ChatStore;
use linkup::shared::messaging::ChatMessage;
use pretty_assertions::assert_eq;
use serde_json::Value;
use uuid::Uuid;

use crate::common::TestChat;

#[tokio::test]
async fn test_health_is_public() {
    let chat = TestChat::new();
    let response = chat.server().get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let chat = TestChat::new();
    let server = chat.server();

    let response = server.get("/api/chat/conversations").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Authentication required");

    let response = server
        .get("/api/chat/conversations")
        .authorization_bearer("not-a-jwt")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "Invalid token");
}

#[tokio::test]
async fn test_token_for_deleted_user_is_refused() {
    let chat = TestChat::new();
    let ghost = linkup::shared::messaging::UserProfile::new(Uuid::new_v4(), "g@example.com", "G");
    let response = chat
        .server()
        .get("/api/chat/conversations")
        .authorization_bearer(chat.token(&ghost))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "User not found");
}

#[tokio::test]
async fn test_socket_handshake_without_token_is_401() {
    let chat = TestChat::new();
    let server = chat.server();

    server
        .get("/socket")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/socket")
        .add_query_param("token", "garbage")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_or_create_conversation_is_idempotent() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let server = chat.server();

    let first = server
        .get(&format!("/api/chat/conversation/user/{}", bob.id))
        .authorization_bearer(chat.token(&ada))
        .await;
    first.assert_status_ok();
    let first = first.json::<Value>();
    assert_eq!(first["message"], "Conversation retrieved successfully");
    assert_eq!(first["conversation"]["otherUser"]["name"], "Bob");

    let second = server
        .get(&format!("/api/chat/conversation/user/{}", ada.id))
        .authorization_bearer(chat.token(&bob))
        .await
        .json::<Value>();
    assert_eq!(second["conversation"]["id"], first["conversation"]["id"]);
    assert_eq!(second["conversation"]["otherUser"]["name"], "Ada");
}

#[tokio::test]
async fn test_get_or_create_conversation_rejections() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let stranger = chat.user("Stranger").await;
    let server = chat.server();
    let token = chat.token(&ada);

    let response = server
        .get("/api/chat/conversation/user/not-a-uuid")
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"], "Invalid userId");

    let response = server
        .get(&format!("/api/chat/conversation/user/{}", ada.id))
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"],
        "Cannot create conversation with yourself"
    );

    let response = server
        .get(&format!("/api/chat/conversation/user/{}", stranger.id))
        .authorization_bearer(&token)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(
        response.json::<Value>()["error"],
        "You must be friends to start a conversation"
    );
}

#[tokio::test]
async fn test_list_conversations_hides_inactive() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let carol = chat.user("Carol").await;
    chat.befriend(&ada, &bob).await;
    chat.befriend(&ada, &carol).await;
    chat.conversation(&ada, &bob).await;
    chat.conversation(&ada, &carol).await;
    chat.store.remove_friendship(ada.id, carol.id).await;

    let body = chat
        .server()
        .get("/api/chat/conversations")
        .authorization_bearer(chat.token(&ada))
        .await
        .json::<Value>();

    assert_eq!(body["count"], 1);
    assert_eq!(body["conversations"][0]["otherUser"]["id"], bob.id.to_string());
}

#[tokio::test]
async fn test_get_conversation_access() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let carol = chat.user("Carol").await;
    let conversation = chat.conversation(&ada, &bob).await;
    let server = chat.server();
    let path = format!("/api/chat/conversation/{}", conversation.id);

    let response = server.get(&path).authorization_bearer(chat.token(&bob)).await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>()["conversation"]["id"],
        conversation.id.to_string()
    );

    server
        .get(&path)
        .authorization_bearer(chat.token(&carol))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    server
        .get(&format!("/api/chat/conversation/{}", Uuid::new_v4()))
        .authorization_bearer(chat.token(&bob))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_message_history_pages_from_newest() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let conversation = chat.conversation(&ada, &bob).await;
    for i in 1..=5 {
        let message = ChatMessage::new_text(conversation.id, ada.id, format!("m{}", i));
        chat.store.create_message(&message).await.unwrap();
    }
    let server = chat.server();
    let path = format!("/api/chat/conversation/{}/messages", conversation.id);

    let body = server
        .get(&path)
        .add_query_param("page", 1)
        .add_query_param("limit", 2)
        .authorization_bearer(chat.token(&bob))
        .await
        .json::<Value>();
    let contents: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["m4", "m5"]);
    assert_eq!(body["pagination"]["total"], 5);
    assert_eq!(body["messages"][0]["sender"]["name"], "Ada");

    let body = server
        .get(&path)
        .add_query_param("page", 3)
        .add_query_param("limit", 2)
        .authorization_bearer(chat.token(&bob))
        .await
        .json::<Value>();
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(body["messages"][0]["content"], "m1");
}

#[tokio::test]
async fn test_message_history_validates_paging() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let conversation = chat.conversation(&ada, &bob).await;
    let server = chat.server();
    let path = format!("/api/chat/conversation/{}/messages", conversation.id);

    server
        .get(&path)
        .add_query_param("limit", "100")
        .authorization_bearer(chat.token(&ada))
        .await
        .assert_status_ok();

    for (page, limit) in [("0", "10"), ("1", "0"), ("1", "101"), ("x", "10")] {
        server
            .get(&path)
            .add_query_param("page", page)
            .add_query_param("limit", limit)
            .authorization_bearer(chat.token(&ada))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_history_hides_deleted_and_falls_back_for_missing_senders() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let conversation = chat.conversation(&ada, &bob).await;

    let gone = ChatMessage::new_text(conversation.id, Uuid::new_v4(), "from a deleted account");
    let hidden = ChatMessage::new_text(conversation.id, ada.id, "deleted");
    chat.store.create_message(&gone).await.unwrap();
    chat.store.create_message(&hidden).await.unwrap();
    chat.store.delete_message(hidden.id).await;

    let body = chat
        .server()
        .get(&format!("/api/chat/conversation/{}/messages", conversation.id))
        .authorization_bearer(chat.token(&ada))
        .await
        .json::<Value>();

    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["messages"][0]["sender"]["name"], "Unknown user");
}
