//! Messaging Module
//!
//! This module contains all the data structures for the chat system:
//!
//! - `UserProfile` - The public slice of a user record
//! - `ChatMessage` - A message in a conversation
//! - `Conversation` - A one-on-one conversation between two users
//!
//! # Usage
//!
//! ```rust
//! use linkup::shared::messaging::{ChatMessage, Conversation, UserProfile};
//! ```

pub mod conversation;
pub mod message;
pub mod user;

// Re-export all types
pub use conversation::{
    Conversation, ConversationResponse, ConversationView, ListConversationsResponse, Participant,
    ParticipantPair,
};
pub use message::{
    ChatMessage, ListMessagesResponse, MessageType, MessageView, Pagination, ReadReceipt,
};
pub use user::UserProfile;
