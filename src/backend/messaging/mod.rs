//! Messaging Module
//!
//! REST access to conversations and message history. Live delivery goes
//! through the socket in `backend::chat`; these endpoints serve the initial
//! load and paging back through older messages.

pub mod handlers;

pub use handlers::{
    get_conversation, get_messages, get_or_create_conversation, health, list_conversations,
    PageParams,
};
