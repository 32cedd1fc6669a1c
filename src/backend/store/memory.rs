//! In-memory chat store
//!
//! Backs the server when no `DATABASE_URL` is configured and drives the
//! test suites. Besides the [`ChatStore`] operations it exposes seeding
//! helpers for users and friendships, plus failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChatStore, ConversationLookup, StoreError, StoreResult, FRIENDSHIP_REMOVED};
use crate::shared::messaging::{ChatMessage, Conversation, ParticipantPair, UserProfile};

/// Store operations that can be made to fail on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    FindUser,
    FindConversation,
    CreateMessage,
    TouchConversation,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserProfile>,
    friendships: HashSet<ParticipantPair>,
    conversations: HashMap<Uuid, Conversation>,
    /// Active conversation per participant pair
    active_pairs: HashMap<ParticipantPair, Uuid>,
    /// Messages in insertion order
    messages: Vec<ChatMessage>,
    message_index: HashMap<Uuid, usize>,
    fail_points: HashSet<FailPoint>,
}

impl Inner {
    fn check(&self, point: FailPoint, name: &'static str) -> StoreResult<()> {
        if self.fail_points.contains(&point) {
            return Err(StoreError::Injected(name));
        }
        Ok(())
    }
}

/// Process-local [`ChatStore`]
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    friendship_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: UserProfile) {
        self.inner.write().await.users.insert(user.id, user);
    }

    pub async fn add_friendship(&self, a: Uuid, b: Uuid) {
        self.inner
            .write()
            .await
            .friendships
            .insert(ParticipantPair::new(a, b));
    }

    /// Remove the friendship and deactivate the pair's conversations
    pub async fn remove_friendship(&self, a: Uuid, b: Uuid) -> u64 {
        self.inner
            .write()
            .await
            .friendships
            .remove(&ParticipantPair::new(a, b));
        // Deactivation cannot fail in memory
        self.deactivate_conversations(a, b, FRIENDSHIP_REMOVED)
            .await
            .unwrap_or_default()
    }

    pub async fn fail_on(&self, point: FailPoint) {
        self.inner.write().await.fail_points.insert(point);
    }

    pub async fn clear_failures(&self) {
        self.inner.write().await.fail_points.clear();
    }

    pub async fn message_count(&self) -> usize {
        self.inner.read().await.messages.len()
    }

    /// Messages of a conversation in creation order, deleted ones included
    pub async fn messages_in(&self, conversation_id: Uuid) -> Vec<ChatMessage> {
        self.inner
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    /// Soft-delete a message
    pub async fn delete_message(&self, message_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let Some(&idx) = inner.message_index.get(&message_id) else {
            return false;
        };
        let now = Utc::now();
        let message = &mut inner.messages[idx];
        message.is_deleted = true;
        message.deleted_at = Some(now);
        message.updated_at = now;
        true
    }

    /// Number of friendship lookups served so far
    pub fn friendship_lookups(&self) -> usize {
        self.friendship_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let inner = self.inner.read().await;
        inner.check(FailPoint::FindUser, "find_user")?;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn find_users(&self, user_ids: &[Uuid]) -> StoreResult<Vec<UserProfile>> {
        let inner = self.inner.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn are_friends(&self, a: Uuid, b: Uuid) -> StoreResult<bool> {
        self.friendship_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .inner
            .read()
            .await
            .friendships
            .contains(&ParticipantPair::new(a, b)))
    }

    async fn find_conversation(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>> {
        let inner = self.inner.read().await;
        inner.check(FailPoint::FindConversation, "find_conversation")?;
        Ok(inner.conversations.get(&conversation_id).cloned())
    }

    async fn find_or_create_conversation(
        &self,
        creator: Uuid,
        other: Uuid,
    ) -> StoreResult<ConversationLookup> {
        let pair = ParticipantPair::new(creator, other);
        let mut inner = self.inner.write().await;

        if let Some(conversation) = inner
            .active_pairs
            .get(&pair)
            .and_then(|id| inner.conversations.get(id))
        {
            return Ok(ConversationLookup {
                conversation: conversation.clone(),
                created: false,
            });
        }

        let conversation = Conversation::new_direct(creator, other);
        inner.active_pairs.insert(pair, conversation.id);
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(ConversationLookup {
            conversation,
            created: true,
        })
    }

    async fn list_conversations(&self, user_id: Uuid) -> StoreResult<Vec<Conversation>> {
        let inner = self.inner.read().await;
        let mut conversations: Vec<Conversation> = inner
            .conversations
            .values()
            .filter(|c| c.is_active && c.has_participant(user_id))
            .cloned()
            .collect();
        // Newest activity first; conversations without messages sort last
        conversations.sort_by(|a, b| {
            b.last_message_at
                .cmp(&a.last_message_at)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(conversations)
    }

    async fn touch_conversation(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.check(FailPoint::TouchConversation, "touch_conversation")?;
        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or(StoreError::NotFound("conversation"))?;
        conversation.touch(message_id, at);
        Ok(())
    }

    async fn deactivate_conversations(&self, a: Uuid, b: Uuid, reason: &str) -> StoreResult<u64> {
        let pair = ParticipantPair::new(a, b);
        let mut inner = self.inner.write().await;
        let Some(id) = inner.active_pairs.remove(&pair) else {
            return Ok(0);
        };
        match inner.conversations.get_mut(&id) {
            Some(conversation) if conversation.is_active => {
                conversation.deactivate(reason);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let conversation = inner
            .conversations
            .get_mut(&conversation_id)
            .ok_or(StoreError::NotFound("conversation"))?;
        if let Some(participant) = conversation
            .participants
            .iter_mut()
            .find(|p| p.user_id == user_id)
        {
            participant.last_read = at;
        }
        Ok(())
    }

    async fn create_message(&self, message: &ChatMessage) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.check(FailPoint::CreateMessage, "create_message")?;
        let idx = inner.messages.len();
        inner.messages.push(message.clone());
        inner.message_index.insert(message.id, idx);
        Ok(())
    }

    async fn find_message(&self, message_id: Uuid) -> StoreResult<Option<ChatMessage>> {
        let inner = self.inner.read().await;
        Ok(inner
            .message_index
            .get(&message_id)
            .map(|&idx| inner.messages[idx].clone()))
    }

    async fn messages_page(
        &self,
        conversation_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> StoreResult<(Vec<ChatMessage>, u64)> {
        let inner = self.inner.read().await;
        let visible: Vec<&ChatMessage> = inner
            .messages
            .iter()
            .rev()
            .filter(|m| m.conversation_id == conversation_id && !m.is_deleted)
            .collect();
        let total = visible.len() as u64;
        let page = visible
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn record_read(
        &self,
        message_id: Uuid,
        reader: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let idx = *inner
            .message_index
            .get(&message_id)
            .ok_or(StoreError::NotFound("message"))?;
        Ok(inner.messages[idx].mark_read(reader, at))
    }
}
