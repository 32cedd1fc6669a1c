/**
 * Conversation Room Handlers
 *
 * `joinConversation` admits a connection to a conversation room after
 * checking, in order: authentication, a well-formed id, that the
 * conversation exists, that the caller participates, and that the two
 * participants are still friends. The friendship check always goes to the
 * store so a removed friendship takes effect on the next join.
 *
 * `leaveConversation` is unconditional.
 */

use crate::backend::chat::session::ChatSession;
use crate::backend::error::ChatError;
use crate::backend::realtime::Room;
use crate::shared::event::{parse_id, ConversationRoom, ConversationTarget, ServerEvent};
use crate::shared::messaging::ParticipantPair;

const JOIN_FAILED: &str = "Failed to join conversation";

impl ChatSession {
    pub async fn join_conversation(&mut self, target: ConversationTarget) -> Result<(), ChatError> {
        let user_id = self.require_identity()?.id;
        let conversation_id = parse_id(target.conversation_id.as_deref())
            .ok_or_else(|| ChatError::invalid_payload("Invalid conversationId"))?;

        let store = &self.state.store;
        let conversation = store
            .find_conversation(conversation_id)
            .await
            .map_err(|e| ChatError::persistence(JOIN_FAILED, e))?
            .ok_or(ChatError::ConversationNotFound)?;

        if !conversation.has_participant(user_id) {
            tracing::warn!(
                user_id = %user_id,
                conversation_id = %conversation_id,
                "Join refused: not a participant"
            );
            return Err(ChatError::Unauthorized);
        }

        if let Some(other) = conversation.other_participant(user_id) {
            let friends = store
                .are_friends(user_id, other)
                .await
                .map_err(|e| ChatError::persistence(JOIN_FAILED, e))?;
            self.friendships
                .insert(ParticipantPair::new(user_id, other), friends);
            if !friends {
                return Err(ChatError::FriendshipRequired("join this conversation"));
            }
        }

        self.state
            .hub
            .join(self.connection_id, Room::Conversation(conversation_id))
            .await;
        self.emit(ServerEvent::JoinedConversation(ConversationRoom {
            conversation_id: Some(conversation_id),
        }))
        .await;

        tracing::debug!(
            user_id = %user_id,
            conversation_id = %conversation_id,
            "Joined conversation"
        );
        Ok(())
    }

    /// Leave a conversation room; always confirmed
    pub async fn leave_conversation(&mut self, target: ConversationTarget) {
        let conversation_id = parse_id(target.conversation_id.as_deref());
        if let Some(id) = conversation_id {
            self.state
                .hub
                .leave(self.connection_id, Room::Conversation(id))
                .await;
        }
        self.emit(ServerEvent::LeftConversation(ConversationRoom { conversation_id }))
            .await;
    }
}
