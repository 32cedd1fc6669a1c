//! Chat persistence
//!
//! The chat subsystem talks to storage only through [`ChatStore`]. Two
//! implementations ship with the crate: [`PgChatStore`] for production and
//! [`MemoryStore`] for tests and database-less development.
//!
//! Each method is atomic on its own; callers needing several writes issue
//! them separately and handle partial failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::messaging::{ChatMessage, Conversation, UserProfile};

pub mod memory;
pub mod postgres;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::PgChatStore;

/// Reason recorded when a friendship removal closes a conversation
pub const FRIENDSHIP_REMOVED: &str = "friendship_removed";

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A write targeted a record that does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A stored value could not be mapped back to a domain type
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// Injected by the in-memory store in tests
    #[error("injected failure: {0}")]
    Injected(&'static str),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a find-or-create
#[derive(Debug, Clone)]
pub struct ConversationLookup {
    pub conversation: Conversation,
    /// True when this call created the conversation
    pub created: bool,
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    /// Profiles for the given ids; unknown ids are skipped
    async fn find_users(&self, user_ids: &[Uuid]) -> StoreResult<Vec<UserProfile>>;

    /// Whether a friendship edge exists in either direction
    async fn are_friends(&self, a: Uuid, b: Uuid) -> StoreResult<bool>;

    async fn find_conversation(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>>;

    /// Return the active conversation for the pair, creating it if needed
    ///
    /// Concurrent calls for the same unordered pair must converge on one
    /// conversation.
    async fn find_or_create_conversation(
        &self,
        creator: Uuid,
        other: Uuid,
    ) -> StoreResult<ConversationLookup>;

    /// Active conversations of a user, most recent activity first
    async fn list_conversations(&self, user_id: Uuid) -> StoreResult<Vec<Conversation>>;

    /// Point the conversation at its newest message
    async fn touch_conversation(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Deactivate every active conversation between the pair; returns how many changed
    async fn deactivate_conversations(&self, a: Uuid, b: Uuid, reason: &str) -> StoreResult<u64>;

    /// Record when a participant last fetched the history
    async fn mark_conversation_read(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn create_message(&self, message: &ChatMessage) -> StoreResult<()>;

    async fn find_message(&self, message_id: Uuid) -> StoreResult<Option<ChatMessage>>;

    /// One page of non-deleted messages, newest first, plus the total count
    async fn messages_page(
        &self,
        conversation_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> StoreResult<(Vec<ChatMessage>, u64)>;

    /// Add a read receipt; false when the reader was already recorded
    async fn record_read(
        &self,
        message_id: Uuid,
        reader: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<bool>;
}
