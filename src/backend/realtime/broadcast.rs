/**
 * Presence Broadcasting
 *
 * Online and offline transitions are pushed immediately. The complete
 * online-user list is coalesced: every registry change (re)arms a short
 * timer, and only the last trigger inside the window broadcasts.
 */

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::presence::PresenceRegistry;
use super::rooms::RoomHub;
use crate::shared::event::ServerEvent;

/// Cancel-and-reschedule timer
pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `action` once the window passes without another call
    ///
    /// A call inside the window cancels the previously scheduled action.
    /// Once an action has started it runs to completion.
    pub async fn schedule<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tokio::spawn(action());
        });

        if let Some(previous) = self.pending.lock().await.replace(handle) {
            previous.abort();
        }
    }
}

/// Debounced fan-out of the online-user list
pub struct PresenceBroadcaster {
    presence: Arc<PresenceRegistry>,
    hub: Arc<RoomHub>,
    debouncer: Debouncer,
}

impl PresenceBroadcaster {
    pub fn new(presence: Arc<PresenceRegistry>, hub: Arc<RoomHub>, window: Duration) -> Self {
        Self {
            presence,
            hub,
            debouncer: Debouncer::new(window),
        }
    }

    /// Arm the `onlineUsersList` broadcast
    pub async fn schedule_online_list(&self) {
        let presence = Arc::clone(&self.presence);
        let hub = Arc::clone(&self.hub);
        self.debouncer
            .schedule(move || async move {
                let user_ids = presence.online_user_ids().await;
                let count = user_ids.len();
                let delivered = hub.broadcast(ServerEvent::online_users(user_ids)).await;
                tracing::debug!(
                    online = count,
                    delivered,
                    "Broadcast online users list"
                );
            })
            .await;
    }
}
