/**
 * Real-time Event Protocol
 *
 * This module defines the frames exchanged over the chat WebSocket.
 *
 * Client frames carry an event name, a JSON payload and an optional
 * acknowledgment id:
 *
 * ```json
 * {"event": "sendMessage", "data": {"conversationId": "...", "senderId": "...", "content": "hi"}, "ack": 7}
 * ```
 *
 * Server frames are adjacently tagged `{"event": ..., "data": ...}`.
 * Acknowledgments travel as an `ack` event whose payload echoes the id.
 */
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::messaging::{MessageType, MessageView, UserProfile};

/// Raw frame received from a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    /// Present when the client wants an acknowledgment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

impl ClientFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
            ack: None,
        }
    }

    pub fn with_ack(mut self, ack: u64) -> Self {
        self.ack = Some(ack);
        self
    }
}

/// Payload naming a conversation room
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTarget {
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadPayload {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub is_typing: bool,
}

/// Decoded client event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Legacy explicit join of a personal room
    JoinUser(Option<String>),
    JoinConversation(ConversationTarget),
    LeaveConversation(ConversationTarget),
    SendMessage(SendMessagePayload),
    MarkAsRead(MarkAsReadPayload),
    Typing(TypingPayload),
}

impl ClientEvent {
    /// Decode a frame into a typed event
    ///
    /// A `null` or absent payload decodes as an empty object, so handlers see
    /// missing fields rather than a decoding failure.
    pub fn from_frame(frame: &ClientFrame) -> Result<Self, SharedError> {
        let data = if frame.data.is_null() {
            Value::Object(Default::default())
        } else {
            frame.data.clone()
        };

        let event = match frame.event.as_str() {
            "joinUser" => ClientEvent::JoinUser(match data {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
            "joinConversation" => ClientEvent::JoinConversation(serde_json::from_value(data)?),
            "leaveConversation" => ClientEvent::LeaveConversation(serde_json::from_value(data)?),
            "sendMessage" => ClientEvent::SendMessage(serde_json::from_value(data)?),
            "markAsRead" => ClientEvent::MarkAsRead(serde_json::from_value(data)?),
            "typing" => ClientEvent::Typing(serde_json::from_value(data)?),
            other => return Err(SharedError::unknown_event(other)),
        };
        Ok(event)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinUser(_) => "joinUser",
            ClientEvent::JoinConversation(_) => "joinConversation",
            ClientEvent::LeaveConversation(_) => "leaveConversation",
            ClientEvent::SendMessage(_) => "sendMessage",
            ClientEvent::MarkAsRead(_) => "markAsRead",
            ClientEvent::Typing(_) => "typing",
        }
    }
}

/// Parse an optional id field; blank and malformed values yield `None`
pub fn parse_id(raw: Option<&str>) -> Option<Uuid> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Uuid::parse_str(s).ok())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Authenticated {
    pub message: String,
    pub user: UserProfile,
    pub online_user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUsers {
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceChange {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRoom {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRoom {
    pub conversation_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageNotification {
    pub conversation_id: Uuid,
    pub message: MessageView,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageRead {
    pub message_id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserTyping {
    pub user_id: Uuid,
    pub is_typing: bool,
}

/// `{error: <message>}`, the single shape of every rejection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Acknowledgment of a client frame that carried an `ack` id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ack {
    pub ack: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Ack {
    pub fn success(ack: u64, message: MessageView) -> Self {
        Self {
            ack,
            success: true,
            message: Some(message),
            error: None,
        }
    }

    pub fn failure(ack: u64, error: impl Into<String>) -> Self {
        Self {
            ack,
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Event sent from the server to a connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Authenticated(Authenticated),
    OnlineUsersList(OnlineUsers),
    UserOnline(PresenceChange),
    UserOffline(PresenceChange),
    JoinedUserRoom(UserRoom),
    JoinedConversation(ConversationRoom),
    LeftConversation(ConversationRoom),
    NewMessage(MessageView),
    NewMessageNotification(MessageNotification),
    MessageRead(MessageRead),
    UserTyping(UserTyping),
    MessageError(ErrorPayload),
    Error(ErrorPayload),
    Ack(Ack),
}

impl ServerEvent {
    pub fn user_online(user_id: Uuid) -> Self {
        ServerEvent::UserOnline(PresenceChange { user_id })
    }

    pub fn user_offline(user_id: Uuid) -> Self {
        ServerEvent::UserOffline(PresenceChange { user_id })
    }

    pub fn online_users(user_ids: Vec<Uuid>) -> Self {
        ServerEvent::OnlineUsersList(OnlineUsers { user_ids })
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorPayload::new(message))
    }

    pub fn message_error(message: impl Into<String>) -> Self {
        ServerEvent::MessageError(ErrorPayload::new(message))
    }

    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Authenticated(_) => "authenticated",
            ServerEvent::OnlineUsersList(_) => "onlineUsersList",
            ServerEvent::UserOnline(_) => "userOnline",
            ServerEvent::UserOffline(_) => "userOffline",
            ServerEvent::JoinedUserRoom(_) => "joinedUserRoom",
            ServerEvent::JoinedConversation(_) => "joinedConversation",
            ServerEvent::LeftConversation(_) => "leftConversation",
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::NewMessageNotification(_) => "newMessageNotification",
            ServerEvent::MessageRead(_) => "messageRead",
            ServerEvent::UserTyping(_) => "userTyping",
            ServerEvent::MessageError(_) => "messageError",
            ServerEvent::Error(_) => "error",
            ServerEvent::Ack(_) => "ack",
        }
    }
}
