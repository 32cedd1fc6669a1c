//! Presence registry
//!
//! Maps each online user to the set of connections authenticated as that
//! user. A user is online iff their entry exists, and an entry never exists
//! empty.

use std::collections::{HashMap, HashSet};

use tokio::sync::RwLock;
use uuid::Uuid;

use super::rooms::ConnectionId;

#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: RwLock<HashMap<Uuid, HashSet<ConnectionId>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection; returns true if it is the user's first
    pub async fn register(&self, user_id: Uuid, connection: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        let set = entries.entry(user_id).or_default();
        let first = set.is_empty();
        set.insert(connection);
        first
    }

    /// Remove a connection; returns true if it was the user's last
    pub async fn unregister(&self, user_id: Uuid, connection: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        let Some(set) = entries.get_mut(&user_id) else {
            return false;
        };
        if !set.remove(&connection) {
            return false;
        }
        if set.is_empty() {
            entries.remove(&user_id);
            return true;
        }
        false
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.entries.read().await.contains_key(&user_id)
    }

    /// Online user ids in ascending order
    pub async fn online_user_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.entries.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    pub async fn connection_count(&self, user_id: Uuid) -> usize {
        self.entries
            .read()
            .await
            .get(&user_id)
            .map_or(0, HashSet::len)
    }
}
