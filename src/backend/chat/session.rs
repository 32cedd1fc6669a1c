/**
 * Chat Session
 *
 * One `ChatSession` exists per live socket. It owns the connection's
 * identity and friendship cache, and processes that connection's inbound
 * frames one at a time.
 *
 * # Lifecycle
 *
 * 1. `open` registers presence, attaches the connection with a queue large
 *    enough for the presence replay, joins its personal room and greets the
 *    client with `authenticated`.
 * 2. `handle_text` / `handle_frame` dispatch each client event.
 * 3. `close` detaches the connection and settles presence.
 *
 * # Error Channels
 *
 * Room-management failures are reported as `error` events. Message, read
 * receipt and typing failures are reported as `messageError` events. A
 * failed `sendMessage` also answers its acknowledgment, if one was asked for.
 */

use crate::backend::chat::friendship_cache::FriendshipCache;
use crate::backend::error::ChatError;
use crate::backend::realtime::{ConnectionId, EventReceiver, Room};
use crate::backend::server::state::AppState;
use crate::shared::error::SharedError;
use crate::shared::event::{
    Ack, Authenticated, ClientEvent, ClientFrame, ErrorPayload, ServerEvent,
};
use crate::shared::messaging::UserProfile;

const AUTHENTICATED_MESSAGE: &str = "Authentication successful";

/// Which error event a failure is reported through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorChannel {
    Error,
    MessageError,
}

impl ErrorChannel {
    fn for_event(name: &str) -> Self {
        match name {
            "sendMessage" | "markAsRead" | "typing" => ErrorChannel::MessageError,
            _ => ErrorChannel::Error,
        }
    }
}

/// Per-connection chat state
pub struct ChatSession {
    pub(crate) state: AppState,
    pub(crate) connection_id: ConnectionId,
    pub(crate) identity: Option<UserProfile>,
    pub(crate) friendships: FriendshipCache,
}

impl ChatSession {
    fn new(state: AppState, connection_id: ConnectionId, identity: Option<UserProfile>) -> Self {
        let friendships = FriendshipCache::new(
            state.config.friendship_cache_ttl,
            state.config.friendship_cache_capacity,
        );
        Self {
            state,
            connection_id,
            identity,
            friendships,
        }
    }

    /// Admit an authenticated connection
    pub async fn open(state: AppState, identity: UserProfile) -> (Self, EventReceiver) {
        let connection_id = ConnectionId::new();
        let user_id = identity.id;
        let hub = &state.hub;

        let first = state.presence.register(user_id, connection_id).await;
        let online = state.presence.online_user_ids().await;

        // The greeting and replay are queued before the writer drains, so
        // the queue must hold all of them plus the usual headroom
        let events = hub
            .attach_with_capacity(connection_id, online.len() + state.config.outbound_queue)
            .await;
        hub.join(connection_id, Room::User(user_id)).await;

        hub.send_to(
            connection_id,
            ServerEvent::Authenticated(Authenticated {
                message: AUTHENTICATED_MESSAGE.to_string(),
                user: identity.clone(),
                online_user_ids: online.clone(),
            }),
        )
        .await;

        // Replay current presence so the client starts from a full picture
        for other in online.iter().filter(|&&id| id != user_id) {
            hub.send_to(connection_id, ServerEvent::user_online(*other))
                .await;
        }

        if first {
            tracing::info!(user_id = %user_id, "User came online");
            hub.broadcast_except(connection_id, ServerEvent::user_online(user_id))
                .await;
        }
        state.broadcaster.schedule_online_list().await;

        tracing::info!(
            user_id = %user_id,
            email = %identity.email,
            connection = %connection_id,
            "Socket connected"
        );
        let session = Self::new(state, connection_id, Some(identity));
        (session, events)
    }

    /// Attach a connection that never authenticated
    ///
    /// The socket route refuses such connections before the upgrade; this
    /// entry point exists so the per-event authentication guard can be
    /// exercised directly.
    #[doc(hidden)]
    pub async fn anonymous(state: AppState) -> (Self, EventReceiver) {
        let connection_id = ConnectionId::new();
        let events = state.hub.attach(connection_id).await;
        (Self::new(state, connection_id, None), events)
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn identity(&self) -> Option<&UserProfile> {
        self.identity.as_ref()
    }

    /// Identity of the connection, or `AuthenticationRequired`
    pub(crate) fn require_identity(&self) -> Result<&UserProfile, ChatError> {
        self.identity
            .as_ref()
            .ok_or(ChatError::AuthenticationRequired)
    }

    /// Queue an event for this connection only
    pub(crate) async fn emit(&self, event: ServerEvent) {
        self.state.hub.send_to(self.connection_id, event).await;
    }

    /// Decode and dispatch one text frame
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) => self.handle_frame(frame).await,
            Err(e) => {
                tracing::debug!(connection = %self.connection_id, "Malformed frame: {}", e);
                self.emit(ServerEvent::error("Invalid payload")).await;
            }
        }
    }

    /// Dispatch one client event
    pub async fn handle_frame(&mut self, frame: ClientFrame) {
        let channel = ErrorChannel::for_event(&frame.event);
        let ack = frame.ack;

        let event = match ClientEvent::from_frame(&frame) {
            Ok(event) => event,
            Err(SharedError::UnknownEvent { event }) => {
                tracing::debug!(connection = %self.connection_id, event = %event, "Ignoring unknown event");
                return;
            }
            Err(err) => {
                let err = ChatError::from(err);
                let ack = if frame.event == "sendMessage" { ack } else { None };
                self.report(channel, &frame.event, err, ack).await;
                return;
            }
        };

        let name = event.name();
        let result = match event {
            ClientEvent::JoinUser(raw) => self.join_user(raw).await,
            ClientEvent::JoinConversation(target) => self.join_conversation(target).await,
            ClientEvent::LeaveConversation(target) => {
                self.leave_conversation(target).await;
                Ok(())
            }
            ClientEvent::SendMessage(payload) => match self.send_message(payload).await {
                Ok(view) => {
                    if let Some(id) = ack {
                        self.emit(ServerEvent::Ack(Ack::success(id, view))).await;
                    }
                    return;
                }
                Err(err) => {
                    self.report(channel, name, err, ack).await;
                    return;
                }
            },
            ClientEvent::MarkAsRead(payload) => self.mark_as_read(payload).await,
            ClientEvent::Typing(payload) => self.typing(payload).await,
        };

        if let Err(err) = result {
            self.report(channel, name, err, None).await;
        }
    }

    /// Log a failed event and tell the client
    async fn report(&self, channel: ErrorChannel, event: &str, err: ChatError, ack: Option<u64>) {
        match &err {
            ChatError::PersistenceFailure { context, source } => tracing::error!(
                connection = %self.connection_id,
                event,
                "{}: {}",
                context,
                source
            ),
            other => tracing::debug!(
                connection = %self.connection_id,
                event,
                "Rejected: {}",
                other
            ),
        }

        let payload = ErrorPayload::from(&err);
        let event = match channel {
            ErrorChannel::Error => ServerEvent::Error(payload),
            ErrorChannel::MessageError => ServerEvent::MessageError(payload),
        };
        self.emit(event).await;

        if let Some(id) = ack {
            self.emit(ServerEvent::Ack(Ack::failure(id, err.message())))
                .await;
        }
    }

    /// Detach the connection and settle presence
    pub async fn close(self) {
        let state = &self.state;
        state.hub.detach(self.connection_id).await;

        let Some(identity) = &self.identity else {
            return;
        };
        let last = state
            .presence
            .unregister(identity.id, self.connection_id)
            .await;
        if last {
            tracing::info!(user_id = %identity.id, "User went offline");
            state.hub.broadcast(ServerEvent::user_offline(identity.id)).await;
        }
        state.broadcaster.schedule_online_list().await;

        tracing::info!(
            user_id = %identity.id,
            connection = %self.connection_id,
            "Socket disconnected"
        );
    }
}
