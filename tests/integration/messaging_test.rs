//! sendMessage, markAsRead and typing flows

use assert_matches::assert_matches;
use linkup::backend::store::{ChatStore, FailPoint};
use linkup::shared::event::{Ack, ErrorPayload, MessageRead, UserTyping};
use linkup::shared::ServerEvent;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use crate::common::{drain, send, send_with_ack, TestChat};

fn message_payload(conversation_id: Uuid, sender_id: Uuid, content: &str) -> serde_json::Value {
    json!({
        "conversationId": conversation_id.to_string(),
        "senderId": sender_id.to_string(),
        "content": content,
    })
}

#[tokio::test]
async fn test_unauthenticated_connection_cannot_send() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut session, mut events) =
        linkup::backend::chat::ChatSession::anonymous(chat.state.clone()).await;
    send_with_ack(
        &mut session,
        "sendMessage",
        message_payload(conversation.id, ada.id, "hello"),
        1,
    )
    .await;

    assert_eq!(
        drain(&mut events),
        vec![
            ServerEvent::message_error("Authentication required"),
            ServerEvent::Ack(Ack::failure(1, "Authentication required")),
        ]
    );
    assert_eq!(chat.store.message_count().await, 0);
}

#[tokio::test]
async fn test_send_fans_out_to_room_and_personal_rooms() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut ada_session, mut ada_events) = chat.connect(&ada).await;
    let (mut bob_session, mut bob_events) = chat.connect(&bob).await;
    drain(&mut ada_events);

    let join = json!({ "conversationId": conversation.id.to_string() });
    send(&mut ada_session, "joinConversation", join.clone()).await;
    send(&mut bob_session, "joinConversation", join).await;
    drain(&mut ada_events);
    drain(&mut bob_events);

    send_with_ack(
        &mut ada_session,
        "sendMessage",
        message_payload(conversation.id, ada.id, "  hello bob  "),
        7,
    )
    .await;

    let ada_seen = drain(&mut ada_events);
    assert_eq!(ada_seen.len(), 2, "{:?}", ada_seen);
    let view = assert_matches!(&ada_seen[0], ServerEvent::NewMessage(view) => view.clone());
    assert_eq!(view.message.content, "hello bob");
    assert_eq!(view.message.sender_id, ada.id);
    assert_eq!(view.sender, ada);
    assert_eq!(ada_seen[1], ServerEvent::Ack(Ack::success(7, view.clone())));

    let bob_seen = drain(&mut bob_events);
    assert_eq!(bob_seen.len(), 2, "{:?}", bob_seen);
    assert_eq!(bob_seen[0], ServerEvent::NewMessage(view.clone()));
    assert_matches!(
        &bob_seen[1],
        ServerEvent::NewMessageNotification(n) if n.conversation_id == conversation.id && n.message == view
    );

    let stored = chat.store.find_conversation(conversation.id).await.unwrap().unwrap();
    assert_eq!(stored.last_message_id, Some(view.message.id));
}

#[tokio::test]
async fn test_recipient_outside_room_still_gets_notification() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut ada_session, _ada_events) = chat.connect(&ada).await;
    let (_bob_session, mut bob_events) = chat.connect(&bob).await;

    send(
        &mut ada_session,
        "sendMessage",
        message_payload(conversation.id, ada.id, "are you there?"),
    )
    .await;

    let bob_seen = drain(&mut bob_events);
    assert_eq!(bob_seen.len(), 1, "{:?}", bob_seen);
    assert_matches!(&bob_seen[0], ServerEvent::NewMessageNotification(_));
}

#[tokio::test]
async fn test_non_friends_cannot_send() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut session, mut events) = chat.connect(&ada).await;
    let (_bob_session, mut bob_events) = chat.connect(&bob).await;
    drain(&mut events);

    send(
        &mut session,
        "sendMessage",
        message_payload(conversation.id, ada.id, "hi"),
    )
    .await;

    assert_eq!(
        drain(&mut events),
        vec![ServerEvent::message_error("You must be friends to send messages")]
    );
    assert!(drain(&mut bob_events).is_empty());
    assert_eq!(chat.store.message_count().await, 0);
}

#[tokio::test]
async fn test_removed_friendship_blocks_new_sessions() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    assert_eq!(chat.store.remove_friendship(ada.id, bob.id).await, 1);

    let (mut session, mut events) = chat.connect(&ada).await;
    send(
        &mut session,
        "sendMessage",
        message_payload(conversation.id, ada.id, "still there?"),
    )
    .await;
    assert_eq!(
        drain(&mut events),
        vec![ServerEvent::message_error("You must be friends to send messages")]
    );
}

#[tokio::test]
async fn test_sender_must_be_caller() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut session, mut events) = chat.connect(&ada).await;
    send(
        &mut session,
        "sendMessage",
        message_payload(conversation.id, bob.id, "impersonating"),
    )
    .await;

    assert_eq!(drain(&mut events), vec![ServerEvent::message_error("Unauthorized")]);
    assert_eq!(chat.store.message_count().await, 0);
}

#[tokio::test]
async fn test_unknown_conversation_fails_ack() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let (mut session, mut events) = chat.connect(&ada).await;

    send_with_ack(
        &mut session,
        "sendMessage",
        message_payload(Uuid::new_v4(), ada.id, "hello?"),
        3,
    )
    .await;

    assert_eq!(
        drain(&mut events),
        vec![
            ServerEvent::MessageError(ErrorPayload::new("Conversation not found")),
            ServerEvent::Ack(Ack::failure(3, "Conversation not found")),
        ]
    );
}

#[tokio::test]
async fn test_malformed_send_payloads() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let (mut session, mut events) = chat.connect(&ada).await;

    send(&mut session, "sendMessage", json!({ "content": "no ids" })).await;
    send(
        &mut session,
        "sendMessage",
        message_payload(Uuid::new_v4(), ada.id, "   "),
    )
    .await;
    send(&mut session, "sendMessage", json!("not an object")).await;

    assert_eq!(
        drain(&mut events),
        vec![
            ServerEvent::message_error("Invalid payload"),
            ServerEvent::message_error("Invalid payload"),
            ServerEvent::message_error("Invalid payload"),
        ]
    );
}

#[tokio::test]
async fn test_store_failure_reports_generic_error() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;
    let (mut session, mut events) = chat.connect(&ada).await;

    chat.store.fail_on(FailPoint::CreateMessage).await;
    send_with_ack(
        &mut session,
        "sendMessage",
        message_payload(conversation.id, ada.id, "lost"),
        9,
    )
    .await;

    assert_eq!(
        drain(&mut events),
        vec![
            ServerEvent::message_error("Failed to send message"),
            ServerEvent::Ack(Ack::failure(9, "Failed to send message")),
        ]
    );
    assert_eq!(chat.store.message_count().await, 0);
}

#[tokio::test]
async fn test_messages_arrive_in_send_order() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut ada_session, _ada_events) = chat.connect(&ada).await;
    let (mut bob_session, mut bob_events) = chat.connect(&bob).await;
    send(
        &mut bob_session,
        "joinConversation",
        json!({ "conversationId": conversation.id.to_string() }),
    )
    .await;
    drain(&mut bob_events);

    for text in ["one", "two", "three"] {
        send(
            &mut ada_session,
            "sendMessage",
            message_payload(conversation.id, ada.id, text),
        )
        .await;
    }

    let received: Vec<String> = drain(&mut bob_events)
        .into_iter()
        .filter_map(|event| match event {
            ServerEvent::NewMessage(view) => Some(view.message.content),
            _ => None,
        })
        .collect();
    assert_eq!(received, vec!["one", "two", "three"]);

    let stored: Vec<String> = chat
        .store
        .messages_in(conversation.id)
        .await
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(stored, received);
}

#[tokio::test]
async fn test_mark_as_read_relays_to_others_once_per_reader() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut ada_session, mut ada_events) = chat.connect(&ada).await;
    let (mut bob_session, mut bob_events) = chat.connect(&bob).await;
    let join = json!({ "conversationId": conversation.id.to_string() });
    send(&mut ada_session, "joinConversation", join.clone()).await;
    send(&mut bob_session, "joinConversation", join).await;

    send(
        &mut ada_session,
        "sendMessage",
        message_payload(conversation.id, ada.id, "read me"),
    )
    .await;
    let message_id = chat.store.messages_in(conversation.id).await[0].id;
    drain(&mut ada_events);
    drain(&mut bob_events);

    let read = json!({
        "messageId": message_id.to_string(),
        "conversationId": conversation.id.to_string(),
    });
    send(&mut bob_session, "markAsRead", read.clone()).await;
    send(&mut bob_session, "markAsRead", read).await;

    let expected = ServerEvent::MessageRead(MessageRead {
        message_id,
        user_id: bob.id,
    });
    assert_eq!(drain(&mut ada_events), vec![expected.clone(), expected]);
    assert!(drain(&mut bob_events).is_empty());

    let stored = chat.store.find_message(message_id).await.unwrap().unwrap();
    assert_eq!(stored.read_by.len(), 1);
    assert!(stored.is_read_by(bob.id));
}

#[tokio::test]
async fn test_mark_as_read_unknown_message_is_silent() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let (mut session, mut events) = chat.connect(&ada).await;

    send(
        &mut session,
        "markAsRead",
        json!({ "messageId": Uuid::new_v4().to_string() }),
    )
    .await;
    send(&mut session, "markAsRead", json!({})).await;

    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_typing_relays_caller_identity_to_others() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut ada_session, mut ada_events) = chat.connect(&ada).await;
    let (mut bob_session, mut bob_events) = chat.connect(&bob).await;
    let join = json!({ "conversationId": conversation.id.to_string() });
    send(&mut ada_session, "joinConversation", join.clone()).await;
    send(&mut bob_session, "joinConversation", join).await;
    drain(&mut ada_events);
    drain(&mut bob_events);

    send(
        &mut ada_session,
        "typing",
        json!({
            "conversationId": conversation.id.to_string(),
            "userId": bob.id.to_string(),
            "isTyping": true,
        }),
    )
    .await;

    assert_eq!(
        drain(&mut bob_events),
        vec![ServerEvent::UserTyping(UserTyping {
            user_id: ada.id,
            is_typing: true,
        })]
    );
    assert!(drain(&mut ada_events).is_empty());
}

#[tokio::test]
async fn test_unauthenticated_read_and_typing_have_no_effect() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    chat.befriend(&ada, &bob).await;
    let conversation = chat.conversation(&ada, &bob).await;

    let (mut bob_session, mut bob_events) = chat.connect(&bob).await;
    send(
        &mut bob_session,
        "joinConversation",
        json!({ "conversationId": conversation.id.to_string() }),
    )
    .await;
    send(
        &mut bob_session,
        "sendMessage",
        message_payload(conversation.id, bob.id, "hello"),
    )
    .await;
    let message_id = chat.store.messages_in(conversation.id).await[0].id;
    drain(&mut bob_events);

    let (mut session, mut events) =
        linkup::backend::chat::ChatSession::anonymous(chat.state.clone()).await;
    chat.state
        .hub
        .join(
            session.connection_id(),
            linkup::backend::realtime::Room::Conversation(conversation.id),
        )
        .await;

    send(
        &mut session,
        "markAsRead",
        json!({
            "messageId": message_id.to_string(),
            "conversationId": conversation.id.to_string(),
        }),
    )
    .await;
    send(
        &mut session,
        "typing",
        json!({ "conversationId": conversation.id.to_string(), "isTyping": true }),
    )
    .await;

    assert_eq!(
        drain(&mut events),
        vec![
            ServerEvent::message_error("Authentication required"),
            ServerEvent::message_error("Authentication required"),
        ]
    );
    assert!(drain(&mut bob_events).is_empty());
    let stored = chat.store.find_message(message_id).await.unwrap().unwrap();
    assert!(stored.read_by.is_empty());
}
