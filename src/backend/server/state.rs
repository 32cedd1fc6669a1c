/**
 * Application State Management
 *
 * `AppState` is the single container shared by the socket handler, the REST
 * handlers and every chat session. Cloning it is cheap; every field is an
 * `Arc`.
 *
 * # Contents
 *
 * - validated configuration
 * - the persistence backend behind `dyn ChatStore`
 * - the room hub (live connections and rooms)
 * - the presence registry and its debounced broadcaster
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::realtime::{PresenceBroadcaster, PresenceRegistry, RoomHub};
use crate::backend::store::ChatStore;
use crate::shared::ChatConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ChatConfig>,
    pub store: Arc<dyn ChatStore>,
    pub hub: Arc<RoomHub>,
    pub presence: Arc<PresenceRegistry>,
    pub broadcaster: Arc<PresenceBroadcaster>,
}

impl AppState {
    pub fn new(config: ChatConfig, store: Arc<dyn ChatStore>) -> Self {
        let hub = Arc::new(RoomHub::new(config.outbound_queue));
        let presence = Arc::new(PresenceRegistry::new());
        let broadcaster = Arc::new(PresenceBroadcaster::new(
            Arc::clone(&presence),
            Arc::clone(&hub),
            config.presence_debounce,
        ));
        Self {
            config: Arc::new(config),
            store,
            hub,
            presence,
            broadcaster,
        }
    }
}

impl FromRef<AppState> for Arc<dyn ChatStore> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.store)
    }
}

impl FromRef<AppState> for Arc<PresenceRegistry> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.presence)
    }
}
