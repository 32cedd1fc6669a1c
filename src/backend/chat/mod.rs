//! Chat Backend Module
//!
//! The real-time chat surface: the WebSocket endpoint, the per-connection
//! session, and the handlers for every client event.
//!
//! # Module Structure
//!
//! ```text
//! chat/
//! ├── mod.rs              - Module exports and documentation
//! ├── socket.rs           - Handshake, upgrade and socket I/O tasks
//! ├── session.rs          - Per-connection state and event dispatch
//! ├── friendship_cache.rs - Short-lived friendship answers
//! └── handlers/           - Client event handlers
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use linkup::backend::chat::session::ChatSession;
//! use linkup::backend::server::state::AppState;
//! use linkup::shared::messaging::UserProfile;
//! use linkup::shared::ClientFrame;
//!
//! # async fn example(state: AppState, user: UserProfile) {
//! let (mut session, mut events) = ChatSession::open(state, user).await;
//! session
//!     .handle_frame(ClientFrame::new("typing", serde_json::json!({"conversationId": "..."})))
//!     .await;
//! while let Ok(event) = events.try_recv() {
//!     println!("{}", event.name());
//! }
//! session.close().await;
//! # }
//! ```

pub mod friendship_cache;
pub mod handlers;
pub mod session;
pub mod socket;

pub use session::ChatSession;
pub use socket::socket_handler;
