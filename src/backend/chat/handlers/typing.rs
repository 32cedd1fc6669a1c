//! Typing indicator relay
//!
//! Typing events are relayed to the rest of the conversation room and never
//! stored or acknowledged.

use crate::backend::chat::session::ChatSession;
use crate::backend::error::ChatError;
use crate::backend::realtime::Room;
use crate::shared::event::{parse_id, ServerEvent, TypingPayload, UserTyping};

impl ChatSession {
    /// Relay a typing indicator; the relayed user id is always the caller's
    pub async fn typing(&mut self, payload: TypingPayload) -> Result<(), ChatError> {
        let user_id = self.require_identity()?.id;
        let Some(conversation_id) = parse_id(payload.conversation_id.as_deref()) else {
            return Ok(());
        };

        self.state
            .hub
            .emit_to_room_except(
                Room::Conversation(conversation_id),
                self.connection_id,
                ServerEvent::UserTyping(UserTyping {
                    user_id,
                    is_typing: payload.is_typing,
                }),
            )
            .await;
        Ok(())
    }
}
