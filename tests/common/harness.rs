//! In-process chat harness
//!
//! Sessions are opened directly instead of through a real socket; each
//! returns the receiving end of its outbound queue so tests can read exactly
//! what the client would have been sent.

use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use linkup::backend::auth::create_token;
use linkup::backend::chat::ChatSession;
use linkup::backend::realtime::EventReceiver;
use linkup::backend::routes::create_router;
use linkup::backend::server::AppState;
use linkup::backend::store::{ChatStore, MemoryStore};
use linkup::shared::messaging::{Conversation, UserProfile};
use linkup::shared::{ChatConfig, ClientFrame, ServerEvent};
use uuid::Uuid;

pub const TEST_SECRET: &str = "linkup-test-secret";

/// Application state over a seeded in-memory store
pub struct TestChat {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestChat {
    /// Presence list broadcasts are pushed far out so they never interleave
    /// with the events a test is asserting on
    pub fn new() -> Self {
        let config = ChatConfig::builder()
            .jwt_secret(TEST_SECRET)
            .presence_debounce(Duration::from_secs(3600))
            .build()
            .expect("test config is valid");
        Self::with_config(config)
    }

    pub fn with_config(config: ChatConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(config, Arc::clone(&store) as Arc<dyn ChatStore>);
        Self { state, store }
    }

    pub async fn user(&self, name: &str) -> UserProfile {
        let user = UserProfile::new(
            Uuid::new_v4(),
            format!("{}@example.com", name.to_lowercase()),
            name,
        );
        self.store.insert_user(user.clone()).await;
        user
    }

    pub async fn befriend(&self, a: &UserProfile, b: &UserProfile) {
        self.store.add_friendship(a.id, b.id).await;
    }

    pub async fn conversation(&self, a: &UserProfile, b: &UserProfile) -> Conversation {
        self.store
            .find_or_create_conversation(a.id, b.id)
            .await
            .expect("memory store does not fail")
            .conversation
    }

    pub fn token(&self, user: &UserProfile) -> String {
        create_token(TEST_SECRET, user.id, Some(user.email.clone())).expect("token signs")
    }

    /// Open a session and discard its greeting
    pub async fn connect(&self, user: &UserProfile) -> (ChatSession, EventReceiver) {
        let (session, mut events) = ChatSession::open(self.state.clone(), user.clone()).await;
        drain(&mut events);
        (session, events)
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(create_router(self.state.clone())).expect("router builds")
    }
}

impl Default for TestChat {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything currently queued for a connection
pub fn drain(events: &mut EventReceiver) -> Vec<ServerEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

/// Send one client frame through a session
pub async fn send(session: &mut ChatSession, event: &str, data: serde_json::Value) {
    session.handle_frame(ClientFrame::new(event, data)).await;
}

/// Send one client frame that asks for an acknowledgment
pub async fn send_with_ack(
    session: &mut ChatSession,
    event: &str,
    data: serde_json::Value,
    ack: u64,
) {
    session
        .handle_frame(ClientFrame::new(event, data).with_ack(ack))
        .await;
}
