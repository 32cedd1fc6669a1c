/**
 * Message Handlers
 *
 * # sendMessage
 *
 * Preconditions are checked in order and each has its own error:
 *
 * 1. the connection is authenticated
 * 2. conversationId and senderId are well-formed and content is non-blank
 * 3. the conversation exists
 * 4. the sender participates and is the authenticated user
 * 5. the participants are friends (per-connection cache, live lookup on miss)
 *
 * The message insert and the conversation's last-message update run
 * concurrently. Both must succeed for the send to count; a half-applied
 * send is logged with both ids for reconciliation.
 *
 * On success the message goes to the conversation room as `newMessage` and
 * to every other participant's personal room as `newMessageNotification`.
 *
 * # markAsRead
 *
 * Adds the caller to the message's read set and relays `messageRead` to the
 * rest of the conversation room.
 */

use chrono::Utc;
use uuid::Uuid;

use crate::backend::chat::session::ChatSession;
use crate::backend::error::ChatError;
use crate::backend::realtime::Room;
use crate::backend::store::StoreError;
use crate::shared::event::{
    parse_id, MarkAsReadPayload, MessageNotification, MessageRead, SendMessagePayload,
    ServerEvent,
};
use crate::shared::messaging::{ChatMessage, MessageView, ParticipantPair};

const SEND_FAILED: &str = "Failed to send message";
const READ_FAILED: &str = "Failed to mark message as read";

impl ChatSession {
    pub async fn send_message(
        &mut self,
        payload: SendMessagePayload,
    ) -> Result<MessageView, ChatError> {
        let identity = self.require_identity()?.clone();

        let (Some(conversation_id), Some(sender_id)) = (
            parse_id(payload.conversation_id.as_deref()),
            parse_id(payload.sender_id.as_deref()),
        ) else {
            return Err(ChatError::invalid_payload("Invalid payload"));
        };
        let content = payload.content.trim();
        if content.is_empty() {
            return Err(ChatError::invalid_payload("Invalid payload"));
        }

        let conversation = self
            .state
            .store
            .find_conversation(conversation_id)
            .await
            .map_err(|e| ChatError::persistence(SEND_FAILED, e))?
            .ok_or(ChatError::ConversationNotFound)?;

        if sender_id != identity.id || !conversation.has_participant(sender_id) {
            tracing::warn!(
                user_id = %identity.id,
                sender_id = %sender_id,
                conversation_id = %conversation_id,
                "Send refused: sender is not the caller or not a participant"
            );
            return Err(ChatError::Unauthorized);
        }

        if let Some(other) = conversation.other_participant(sender_id) {
            let friends = self
                .friends_cached(sender_id, other)
                .await
                .map_err(|e| ChatError::persistence(SEND_FAILED, e))?;
            if !friends {
                return Err(ChatError::FriendshipRequired("send messages"));
            }
        }

        let message = ChatMessage::new(conversation_id, sender_id, content, payload.message_type);
        self.persist(&message).await?;

        let view = MessageView::new(message, identity);
        let hub = &self.state.hub;
        hub.emit_to_room(
            Room::Conversation(conversation_id),
            ServerEvent::NewMessage(view.clone()),
        )
        .await;
        for participant in conversation
            .participant_ids()
            .into_iter()
            .filter(|&id| id != sender_id)
        {
            hub.emit_to_room(
                Room::User(participant),
                ServerEvent::NewMessageNotification(MessageNotification {
                    conversation_id,
                    message: view.clone(),
                }),
            )
            .await;
        }

        tracing::debug!(
            message_id = %view.message.id,
            conversation_id = %conversation_id,
            sender_id = %sender_id,
            "Message sent"
        );
        Ok(view)
    }

    /// Friendship answer from the cache, falling back to the store
    async fn friends_cached(&mut self, a: Uuid, b: Uuid) -> Result<bool, StoreError> {
        let pair = ParticipantPair::new(a, b);
        if let Some(friends) = self.friendships.get(&pair) {
            return Ok(friends);
        }
        let friends = self.state.store.are_friends(a, b).await?;
        self.friendships.insert(pair, friends);
        Ok(friends)
    }

    /// Store the message and advance the conversation's last-message pointer
    async fn persist(&self, message: &ChatMessage) -> Result<(), ChatError> {
        let store = &self.state.store;
        let (created, touched) = tokio::join!(
            store.create_message(message),
            store.touch_conversation(message.conversation_id, message.id, message.created_at),
        );

        match (created, touched) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) => {
                tracing::error!(
                    message_id = %message.id,
                    conversation_id = %message.conversation_id,
                    "Conversation points at a message that was not stored"
                );
                Err(ChatError::persistence(SEND_FAILED, e))
            }
            (Ok(()), Err(e)) => {
                tracing::error!(
                    message_id = %message.id,
                    conversation_id = %message.conversation_id,
                    "Message stored but conversation last-message not updated"
                );
                Err(ChatError::persistence(SEND_FAILED, e))
            }
            (Err(e), Err(touch_err)) => {
                tracing::error!(
                    message_id = %message.id,
                    conversation_id = %message.conversation_id,
                    "Conversation update also failed: {}",
                    touch_err
                );
                Err(ChatError::persistence(SEND_FAILED, e))
            }
        }
    }

    /// Record a read receipt and tell the rest of the room
    ///
    /// Missing ids and unknown messages are ignored. The relay targets the
    /// message's own conversation, not the one named in the payload.
    pub async fn mark_as_read(&mut self, payload: MarkAsReadPayload) -> Result<(), ChatError> {
        let user_id = self.require_identity()?.id;
        let Some(message_id) = parse_id(payload.message_id.as_deref()) else {
            return Ok(());
        };

        let store = &self.state.store;
        let Some(message) = store
            .find_message(message_id)
            .await
            .map_err(|e| ChatError::persistence(READ_FAILED, e))?
        else {
            tracing::debug!(message_id = %message_id, "markAsRead for unknown message");
            return Ok(());
        };

        let conversation = store
            .find_conversation(message.conversation_id)
            .await
            .map_err(|e| ChatError::persistence(READ_FAILED, e))?
            .ok_or(ChatError::ConversationNotFound)?;
        if !conversation.has_participant(user_id) {
            return Err(ChatError::Unauthorized);
        }

        let newly_read = store
            .record_read(message_id, user_id, Utc::now())
            .await
            .map_err(|e| ChatError::persistence(READ_FAILED, e))?;
        if !newly_read {
            tracing::debug!(message_id = %message_id, user_id = %user_id, "Message already read");
        }

        self.state
            .hub
            .emit_to_room_except(
                Room::Conversation(message.conversation_id),
                self.connection_id,
                ServerEvent::MessageRead(MessageRead {
                    message_id,
                    user_id,
                }),
            )
            .await;
        Ok(())
    }
}
