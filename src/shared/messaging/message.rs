//! Chat Message Data Structure
//!
//! Represents a message in a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserProfile;

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain text message
    #[default]
    Text,
    Image,
    Video,
    File,
}

impl MessageType {
    /// Name used for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::File => "file",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageType {
    type Err = crate::shared::SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageType::Text),
            "image" => Ok(MessageType::Image),
            "video" => Ok(MessageType::Video),
            "file" => Ok(MessageType::File),
            other => Err(crate::shared::SharedError::validation(
                "messageType",
                format!("unknown message type '{}'", other),
            )),
        }
    }
}

/// A reader's acknowledgment of a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub user_id: Uuid,
    pub read_at: DateTime<Utc>,
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique message ID
    pub id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub message_type: MessageType,
    /// Uploaded media backing an image/video/file message
    pub media_id: Option<Uuid>,
    pub is_edited: bool,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    /// At most one receipt per reader
    #[serde(default)]
    pub read_by: Vec<ReadReceipt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new message of the given type
    pub fn new(
        conversation_id: Uuid,
        sender_id: Uuid,
        content: impl Into<String>,
        message_type: MessageType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            content: content.into(),
            message_type,
            media_id: None,
            is_edited: false,
            edited_at: None,
            is_deleted: false,
            deleted_at: None,
            read_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new text message
    pub fn new_text(conversation_id: Uuid, sender_id: Uuid, content: impl Into<String>) -> Self {
        Self::new(conversation_id, sender_id, content, MessageType::Text)
    }

    pub fn is_read_by(&self, user_id: Uuid) -> bool {
        self.read_by.iter().any(|r| r.user_id == user_id)
    }

    /// Record a read receipt; returns false if the reader was already recorded
    pub fn mark_read(&mut self, user_id: Uuid, at: DateTime<Utc>) -> bool {
        if self.is_read_by(user_id) {
            return false;
        }
        self.read_by.push(ReadReceipt { user_id, read_at: at });
        true
    }

    /// Get a preview of the message (first N characters)
    pub fn preview(&self, max_len: usize) -> String {
        if self.content.chars().count() <= max_len {
            self.content.clone()
        } else {
            let mut preview: String = self.content.chars().take(max_len.saturating_sub(3)).collect();
            preview.push_str("...");
            preview
        }
    }
}

/// Message as delivered to clients, with the sender's display fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub sender: UserProfile,
}

impl MessageView {
    pub fn new(message: ChatMessage, sender: UserProfile) -> Self {
        Self { message, sender }
    }
}

/// Pagination metadata for message history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

/// Response for listing messages, oldest first within the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageView>,
    pub pagination: Pagination,
}
