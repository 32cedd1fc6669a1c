//! Postgres chat store
//!
//! Conversations keep their participant pair twice: normalised in
//! `participant_low`/`participant_high` for the uniqueness index, and as rows
//! in `conversation_participants` (creator at position 0) for per-user
//! read state.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{ChatStore, ConversationLookup, StoreError, StoreResult};
use crate::shared::messaging::{
    ChatMessage, Conversation, MessageType, Participant, ParticipantPair, ReadReceipt, UserProfile,
};

const MAX_CONNECTIONS: u32 = 10;

const CONVERSATION_COLUMNS: &str = "id, last_message_id, last_message_at, is_active, created_by, \
     created_at, updated_at, deactivated_at, deactivation_reason";

const MESSAGE_COLUMNS: &str = "id, conversation_id, sender_id, content, message_type, media_id, \
     is_edited, edited_at, is_deleted, deleted_at, created_at, updated_at";

/// [`ChatStore`] backed by a Postgres pool
#[derive(Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run pending migrations
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(database_url)
            .await?;
        tracing::info!("Database connection pool created successfully");

        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Database migrations completed successfully");

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Attach participant rows to conversation rows, preserving row order
    async fn hydrate_conversations(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Conversation>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();

        let participant_rows = sqlx::query(
            r#"
            SELECT conversation_id, user_id, joined_at, last_read
            FROM conversation_participants
            WHERE conversation_id = ANY($1)
            ORDER BY conversation_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut participants: HashMap<Uuid, Vec<Participant>> = HashMap::new();
        for row in participant_rows {
            participants
                .entry(row.get("conversation_id"))
                .or_default()
                .push(Participant {
                    user_id: row.get("user_id"),
                    joined_at: row.get("joined_at"),
                    last_read: row.get("last_read"),
                });
        }

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                let pair: [Participant; 2] = participants
                    .remove(&id)
                    .unwrap_or_default()
                    .try_into()
                    .map_err(|found: Vec<Participant>| {
                        StoreError::Corrupt(format!(
                            "conversation {} has {} participants",
                            id,
                            found.len()
                        ))
                    })?;
                Ok(Conversation {
                    id,
                    participants: pair,
                    last_message_id: row.get("last_message_id"),
                    last_message_at: row.get("last_message_at"),
                    is_active: row.get("is_active"),
                    created_by: row.get("created_by"),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                    deactivated_at: row.get("deactivated_at"),
                    deactivation_reason: row.get("deactivation_reason"),
                })
            })
            .collect()
    }

    /// Attach read receipts to message rows, preserving row order
    async fn hydrate_messages(&self, rows: Vec<PgRow>) -> StoreResult<Vec<ChatMessage>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();

        let read_rows = sqlx::query(
            r#"
            SELECT message_id, user_id, read_at
            FROM message_reads
            WHERE message_id = ANY($1)
            ORDER BY read_at
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut reads: HashMap<Uuid, Vec<ReadReceipt>> = HashMap::new();
        for row in read_rows {
            reads
                .entry(row.get("message_id"))
                .or_default()
                .push(ReadReceipt {
                    user_id: row.get("user_id"),
                    read_at: row.get("read_at"),
                });
        }

        rows.into_iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                let message_type: MessageType = row
                    .get::<String, _>("message_type")
                    .parse()
                    .map_err(|e| StoreError::Corrupt(format!("message {}: {}", id, e)))?;
                Ok(ChatMessage {
                    id,
                    conversation_id: row.get("conversation_id"),
                    sender_id: row.get("sender_id"),
                    content: row.get("content"),
                    message_type,
                    media_id: row.get("media_id"),
                    is_edited: row.get("is_edited"),
                    edited_at: row.get("edited_at"),
                    is_deleted: row.get("is_deleted"),
                    deleted_at: row.get("deleted_at"),
                    read_by: reads.remove(&id).unwrap_or_default(),
                    created_at: row.get("created_at"),
                    updated_at: row.get("updated_at"),
                })
            })
            .collect()
    }
}

fn user_from_row(row: &PgRow) -> UserProfile {
    UserProfile {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        profile_picture: row.get("profile_picture"),
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, email, name, profile_picture FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_users(&self, user_ids: &[Uuid]) -> StoreResult<Vec<UserProfile>> {
        let rows =
            sqlx::query("SELECT id, email, name, profile_picture FROM users WHERE id = ANY($1)")
                .bind(user_ids)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(user_from_row).collect())
    }

    async fn are_friends(&self, a: Uuid, b: Uuid) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM friends
                WHERE (user_id = $1 AND friend_id = $2)
                   OR (user_id = $2 AND friend_id = $1)
            ) AS friends
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("friends"))
    }

    async fn find_conversation(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        ))
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate_conversations(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_or_create_conversation(
        &self,
        creator: Uuid,
        other: Uuid,
    ) -> StoreResult<ConversationLookup> {
        let pair = ParticipantPair::new(creator, other);
        let id = Uuid::new_v4();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;
        // Waits on a concurrent insert of the same pair, then yields nothing
        let inserted = sqlx::query(
            r#"
            INSERT INTO conversations (id, participant_low, participant_high, is_active, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, TRUE, $4, $5, $5)
            ON CONFLICT (participant_low, participant_high) WHERE is_active DO NOTHING
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(pair.low())
        .bind(pair.high())
        .bind(creator)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let created = inserted.is_some();
        if created {
            for (position, user_id) in [(0i16, creator), (1i16, other)] {
                sqlx::query(
                    r#"
                    INSERT INTO conversation_participants (conversation_id, user_id, position, joined_at, last_read)
                    VALUES ($1, $2, $3, $4, $4)
                    "#,
                )
                .bind(id)
                .bind(user_id)
                .bind(position)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }
        tx.commit().await?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM conversations WHERE participant_low = $1 AND participant_high = $2 AND is_active",
            CONVERSATION_COLUMNS
        ))
        .bind(pair.low())
        .bind(pair.high())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("conversation"))?;

        let conversation = self
            .hydrate_conversations(vec![row])
            .await?
            .pop()
            .ok_or(StoreError::NotFound("conversation"))?;
        Ok(ConversationLookup {
            conversation,
            created,
        })
    }

    async fn list_conversations(&self, user_id: Uuid) -> StoreResult<Vec<Conversation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM conversations
            WHERE is_active
              AND id IN (SELECT conversation_id FROM conversation_participants WHERE user_id = $1)
            ORDER BY last_message_at DESC NULLS LAST, updated_at DESC
            "#,
            CONVERSATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        self.hydrate_conversations(rows).await
    }

    async fn touch_conversation(
        &self,
        conversation_id: Uuid,
        message_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_id = $2, last_message_at = $3, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .bind(message_id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("conversation"));
        }
        Ok(())
    }

    async fn deactivate_conversations(&self, a: Uuid, b: Uuid, reason: &str) -> StoreResult<u64> {
        let pair = ParticipantPair::new(a, b);
        let result = sqlx::query(
            r#"
            UPDATE conversations
            SET is_active = FALSE, deactivated_at = NOW(), deactivation_reason = $3, updated_at = NOW()
            WHERE participant_low = $1 AND participant_high = $2 AND is_active
            "#,
        )
        .bind(pair.low())
        .bind(pair.high())
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE conversation_participants
            SET last_read = $3
            WHERE conversation_id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_message(&self, message: &ChatMessage) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, message_type, media_id,
                                  is_edited, edited_at, is_deleted, deleted_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(message.id)
        .bind(message.conversation_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(message.media_id)
        .bind(message.is_edited)
        .bind(message.edited_at)
        .bind(message.is_deleted)
        .bind(message.deleted_at)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_message(&self, message_id: Uuid) -> StoreResult<Option<ChatMessage>> {
        let row = sqlx::query(&format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS))
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate_messages(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn messages_page(
        &self,
        conversation_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> StoreResult<(Vec<ChatMessage>, u64)> {
        let page_sql = format!(
            r#"
            SELECT {}
            FROM messages
            WHERE conversation_id = $1 AND NOT is_deleted
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            MESSAGE_COLUMNS
        );
        let page = sqlx::query(&page_sql)
            .bind(conversation_id)
            .bind(i64::from(limit))
            .bind(i64::try_from(offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool);
        let count = sqlx::query(
            "SELECT COUNT(*) AS total FROM messages WHERE conversation_id = $1 AND NOT is_deleted",
        )
        .bind(conversation_id)
        .fetch_one(&self.pool);

        let (rows, count_row) = tokio::try_join!(page, count)?;
        let total: i64 = count_row.get("total");
        let messages = self.hydrate_messages(rows).await?;
        Ok((messages, u64::try_from(total).unwrap_or_default()))
    }

    async fn record_read(
        &self,
        message_id: Uuid,
        reader: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO message_reads (message_id, user_id, read_at)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM messages WHERE id = $1)
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(message_id)
        .bind(reader)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        let exists: bool = sqlx::query("SELECT EXISTS (SELECT 1 FROM messages WHERE id = $1) AS found")
            .bind(message_id)
            .fetch_one(&self.pool)
            .await?
            .get("found");
        if exists {
            Ok(false)
        } else {
            Err(StoreError::NotFound("message"))
        }
    }
}
