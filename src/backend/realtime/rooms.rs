/**
 * Connection and Room Hub
 *
 * Every live socket is attached to the hub with a bounded outbound queue.
 * Rooms are named broadcast groups: one per user (personal room) and one
 * per conversation. Delivery is a non-blocking `try_send` per member; a
 * full or closed queue drops the event for that connection only.
 */

use std::collections::{HashMap, HashSet};
use std::fmt;

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::shared::event::ServerEvent;

/// Identifier of one live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Broadcast group name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(Uuid),
    Conversation(Uuid),
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Room::User(id) => write!(f, "user:{}", id),
            Room::Conversation(id) => write!(f, "conversation:{}", id),
        }
    }
}

pub type EventSender = mpsc::Sender<ServerEvent>;
pub type EventReceiver = mpsc::Receiver<ServerEvent>;

#[derive(Default)]
struct HubInner {
    connections: HashMap<ConnectionId, EventSender>,
    rooms: HashMap<Room, HashSet<ConnectionId>>,
    memberships: HashMap<ConnectionId, HashSet<Room>>,
}

impl HubInner {
    fn deliver(&self, connection: ConnectionId, event: &ServerEvent) -> bool {
        let Some(sender) = self.connections.get(&connection) else {
            return false;
        };
        match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    connection = %connection,
                    event = event.name(),
                    "Outbound queue full, dropping event"
                );
                false
            }
            // Writer already gone; the session will detach shortly
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Registry of live connections and their room memberships
pub struct RoomHub {
    inner: RwLock<HubInner>,
    queue_size: usize,
}

impl RoomHub {
    pub fn new(queue_size: usize) -> Self {
        Self {
            inner: RwLock::new(HubInner::default()),
            queue_size: queue_size.max(1),
        }
    }

    /// Register a connection and hand back the receiving end of its queue
    pub async fn attach(&self, connection: ConnectionId) -> EventReceiver {
        self.attach_with_capacity(connection, self.queue_size).await
    }

    /// Register a connection whose queue holds at least `capacity` events
    ///
    /// Used when a burst larger than the configured queue must be queued
    /// before the writer starts draining.
    pub async fn attach_with_capacity(
        &self,
        connection: ConnectionId,
        capacity: usize,
    ) -> EventReceiver {
        let (tx, rx) = mpsc::channel(capacity.max(self.queue_size));
        let mut inner = self.inner.write().await;
        inner.connections.insert(connection, tx);
        inner.memberships.entry(connection).or_default();
        rx
    }

    /// Drop a connection from the hub and every room it joined
    pub async fn detach(&self, connection: ConnectionId) {
        let mut inner = self.inner.write().await;
        inner.connections.remove(&connection);
        let rooms = inner.memberships.remove(&connection).unwrap_or_default();
        for room in rooms {
            if let Some(members) = inner.rooms.get_mut(&room) {
                members.remove(&connection);
                if members.is_empty() {
                    inner.rooms.remove(&room);
                }
            }
        }
    }

    /// Join a room; joining twice is a no-op
    pub async fn join(&self, connection: ConnectionId, room: Room) {
        let mut inner = self.inner.write().await;
        if !inner.connections.contains_key(&connection) {
            return;
        }
        inner.rooms.entry(room).or_default().insert(connection);
        inner.memberships.entry(connection).or_default().insert(room);
    }

    /// Leave a room; leaving a room never joined is a no-op
    pub async fn leave(&self, connection: ConnectionId, room: Room) {
        let mut inner = self.inner.write().await;
        if let Some(rooms) = inner.memberships.get_mut(&connection) {
            rooms.remove(&room);
        }
        if let Some(members) = inner.rooms.get_mut(&room) {
            members.remove(&connection);
            if members.is_empty() {
                inner.rooms.remove(&room);
            }
        }
    }

    pub async fn is_member(&self, connection: ConnectionId, room: Room) -> bool {
        self.inner
            .read()
            .await
            .rooms
            .get(&room)
            .is_some_and(|members| members.contains(&connection))
    }

    pub async fn members(&self, room: Room) -> Vec<ConnectionId> {
        self.inner
            .read()
            .await
            .rooms
            .get(&room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.connections.len()
    }

    /// Send to one connection; returns whether the event was queued
    pub async fn send_to(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        self.inner.read().await.deliver(connection, &event)
    }

    /// Send to every member of a room; returns how many queued it
    pub async fn emit_to_room(&self, room: Room, event: ServerEvent) -> usize {
        self.emit_filtered(room, None, event).await
    }

    /// Send to every member of a room except `skip`
    pub async fn emit_to_room_except(
        &self,
        room: Room,
        skip: ConnectionId,
        event: ServerEvent,
    ) -> usize {
        self.emit_filtered(room, Some(skip), event).await
    }

    async fn emit_filtered(
        &self,
        room: Room,
        skip: Option<ConnectionId>,
        event: ServerEvent,
    ) -> usize {
        let inner = self.inner.read().await;
        let Some(members) = inner.rooms.get(&room) else {
            return 0;
        };
        members
            .iter()
            .filter(|&&c| Some(c) != skip)
            .filter(|&&c| inner.deliver(c, &event))
            .count()
    }

    /// Send to every attached connection
    pub async fn broadcast(&self, event: ServerEvent) -> usize {
        self.broadcast_filtered(None, event).await
    }

    /// Send to every attached connection except `skip`
    pub async fn broadcast_except(&self, skip: ConnectionId, event: ServerEvent) -> usize {
        self.broadcast_filtered(Some(skip), event).await
    }

    async fn broadcast_filtered(&self, skip: Option<ConnectionId>, event: ServerEvent) -> usize {
        let inner = self.inner.read().await;
        inner
            .connections
            .keys()
            .filter(|&&c| Some(c) != skip)
            .filter(|&&c| inner.deliver(c, &event))
            .count()
    }
}
