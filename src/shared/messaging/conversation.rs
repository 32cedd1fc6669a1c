//! Conversation Data Structure
//!
//! Represents a one-on-one conversation between two users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserProfile;

/// Unordered pair of user IDs, normalised so `(a, b)` and `(b, a)` compare equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: Uuid,
    high: Uuid,
}

impl ParticipantPair {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> Uuid {
        self.low
    }

    pub fn high(&self) -> Uuid {
        self.high
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.low == user_id || self.high == user_id
    }
}

impl std::fmt::Display for ParticipantPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.low, self.high)
    }
}

/// One side of a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
    /// Last time this participant fetched the message history
    pub last_read: DateTime<Utc>,
}

impl Participant {
    pub fn new(user_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            joined_at: at,
            last_read: at,
        }
    }
}

/// Represents a conversation between exactly two users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// The two participants, creator first
    pub participants: [Participant; 2],
    /// Most recent message, advisory only
    pub last_message_id: Option<Uuid>,
    /// Timestamp of the most recent message
    pub last_message_at: Option<DateTime<Utc>>,
    /// Inactive conversations keep their history but drop out of listings
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub deactivation_reason: Option<String>,
}

impl Conversation {
    /// Create a new direct conversation started by `creator`
    pub fn new_direct(creator: Uuid, other: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            participants: [Participant::new(creator, now), Participant::new(other, now)],
            last_message_id: None,
            last_message_at: None,
            is_active: true,
            created_by: creator,
            created_at: now,
            updated_at: now,
            deactivated_at: None,
            deactivation_reason: None,
        }
    }

    /// Check if user is a participant
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.user_id == user_id)
    }

    /// Get the other participant
    pub fn other_participant(&self, current_user_id: Uuid) -> Option<Uuid> {
        self.participants
            .iter()
            .map(|p| p.user_id)
            .find(|&id| id != current_user_id)
    }

    pub fn participant_ids(&self) -> [Uuid; 2] {
        [self.participants[0].user_id, self.participants[1].user_id]
    }

    pub fn pair(&self) -> ParticipantPair {
        ParticipantPair::new(self.participants[0].user_id, self.participants[1].user_id)
    }

    /// Record a new last message
    pub fn touch(&mut self, message_id: Uuid, at: DateTime<Utc>) {
        self.last_message_id = Some(message_id);
        self.last_message_at = Some(at);
        self.updated_at = at;
    }

    pub fn deactivate(&mut self, reason: impl Into<String>) {
        let now = Utc::now();
        self.is_active = false;
        self.deactivated_at = Some(now);
        self.deactivation_reason = Some(reason.into());
        self.updated_at = now;
    }
}

/// Conversation enriched with the profile of the participant who is not the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub other_user: Option<UserProfile>,
}

/// Response for listing conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<ConversationView>,
    pub count: usize,
}

/// Response for a single conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation: ConversationView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
