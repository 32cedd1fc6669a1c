//! Explicit personal-room join
//!
//! Connections join their personal room on admission. `joinUser` remains for
//! older clients that still ask for it.

use crate::backend::chat::session::ChatSession;
use crate::backend::error::ChatError;
use crate::backend::realtime::Room;
use crate::shared::event::{parse_id, ServerEvent, UserRoom};

impl ChatSession {
    /// Join the caller's own personal room
    ///
    /// Missing or malformed ids are ignored. Naming another user's room is
    /// rejected.
    pub async fn join_user(&mut self, raw: Option<String>) -> Result<(), ChatError> {
        let identity = self.require_identity()?;
        let Some(user_id) = parse_id(raw.as_deref()) else {
            return Ok(());
        };
        if user_id != identity.id {
            tracing::warn!(
                connection = %self.connection_id,
                user_id = %identity.id,
                requested = %user_id,
                "Refused join of another user's room"
            );
            return Err(ChatError::Unauthorized);
        }

        self.state
            .hub
            .join(self.connection_id, Room::User(user_id))
            .await;
        self.emit(ServerEvent::JoinedUserRoom(UserRoom { user_id }))
            .await;
        Ok(())
    }
}
