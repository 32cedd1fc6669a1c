//! Presence tracking across connections

use std::time::Duration;

use linkup::shared::event::Authenticated;
use linkup::shared::{ChatConfig, ServerEvent};
use pretty_assertions::assert_eq;

use crate::common::{drain, TestChat};

#[tokio::test]
async fn test_greeting_lists_everyone_online() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let (_ada_session, _ada_events) = chat.connect(&ada).await;

    let (_bob_session, mut bob_events) =
        linkup::backend::chat::ChatSession::open(chat.state.clone(), bob.clone()).await;

    let mut expected_online = vec![ada.id, bob.id];
    expected_online.sort();
    assert_eq!(
        drain(&mut bob_events),
        vec![
            ServerEvent::Authenticated(Authenticated {
                message: "Authentication successful".to_string(),
                user: bob.clone(),
                online_user_ids: expected_online,
            }),
            ServerEvent::user_online(ada.id),
        ]
    );
}

#[tokio::test]
async fn test_second_device_does_not_rebroadcast_online() {
    let chat = TestChat::new();
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let (_bob_session, mut bob_events) = chat.connect(&bob).await;

    let (phone, _phone_events) = chat.connect(&ada).await;
    let (laptop, _laptop_events) = chat.connect(&ada).await;
    assert_eq!(drain(&mut bob_events), vec![ServerEvent::user_online(ada.id)]);
    assert_eq!(chat.state.presence.connection_count(ada.id).await, 2);

    phone.close().await;
    assert!(drain(&mut bob_events).is_empty());
    assert!(chat.state.presence.is_online(ada.id).await);

    laptop.close().await;
    assert_eq!(drain(&mut bob_events), vec![ServerEvent::user_offline(ada.id)]);
    assert!(!chat.state.presence.is_online(ada.id).await);
}

#[tokio::test(start_paused = true)]
async fn test_online_list_is_debounced() {
    let config = ChatConfig::builder()
        .jwt_secret(crate::common::TEST_SECRET)
        .presence_debounce(Duration::from_millis(100))
        .build()
        .unwrap();
    let chat = TestChat::with_config(config);
    let ada = chat.user("Ada").await;
    let bob = chat.user("Bob").await;
    let carol = chat.user("Carol").await;

    let (_ada_session, mut ada_events) = chat.connect(&ada).await;
    let (_bob_session, _bob_events) = chat.connect(&bob).await;
    let (_carol_session, _carol_events) = chat.connect(&carol).await;
    drain(&mut ada_events);

    tokio::time::sleep(Duration::from_millis(150)).await;

    let mut online = vec![ada.id, bob.id, carol.id];
    online.sort();
    let lists: Vec<ServerEvent> = drain(&mut ada_events)
        .into_iter()
        .filter(|e| matches!(e, ServerEvent::OnlineUsersList(_)))
        .collect();
    assert_eq!(lists, vec![ServerEvent::online_users(online)]);
}

#[tokio::test]
async fn test_replay_survives_small_outbound_queue() {
    let config = ChatConfig::builder()
        .jwt_secret(crate::common::TEST_SECRET)
        .presence_debounce(Duration::from_secs(3600))
        .outbound_queue(4)
        .build()
        .unwrap();
    let chat = TestChat::with_config(config);

    let mut sessions = Vec::new();
    let mut others = Vec::new();
    for i in 0..6 {
        let user = chat.user(&format!("User{}", i)).await;
        others.push(user.id);
        sessions.push(chat.connect(&user).await);
    }

    let newcomer = chat.user("Newcomer").await;
    let (_session, mut events) =
        linkup::backend::chat::ChatSession::open(chat.state.clone(), newcomer).await;

    let seen = drain(&mut events);
    assert!(matches!(seen[0], ServerEvent::Authenticated(_)));
    let mut replayed: Vec<_> = seen[1..]
        .iter()
        .filter_map(|e| match e {
            ServerEvent::UserOnline(p) => Some(p.user_id),
            _ => None,
        })
        .collect();
    replayed.sort();
    others.sort();
    assert_eq!(replayed, others);
}
