//! Chat Event Handlers
//!
//! Each submodule adds the handlers for one group of client events to
//! [`ChatSession`](crate::backend::chat::session::ChatSession).
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs          - Module documentation
//! ├── user.rs         - joinUser
//! ├── conversation.rs - joinConversation, leaveConversation
//! ├── message.rs      - sendMessage, markAsRead
//! └── typing.rs       - typing
//! ```
//!
//! Handlers return `Result<_, ChatError>`; the session turns failures into
//! the right error event.

pub mod conversation;
pub mod message;
pub mod typing;
pub mod user;
