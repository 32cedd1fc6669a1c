//! Backend Module
//!
//! Server-side code for the linkup chat service: an Axum server exposing a
//! WebSocket endpoint for live messaging and a small REST API for history.
//!
//! This module is only compiled when the `server` feature is enabled.
//!
//! # Architecture
//!
//! - **`server`** - Application state, store selection, app creation
//! - **`routes`** - Route configuration and router assembly
//! - **`chat`** - Socket handshake, per-connection sessions, event handlers
//! - **`messaging`** - REST conversation and history handlers
//! - **`realtime`** - Rooms, presence and debounced presence broadcasts
//! - **`store`** - Persistence trait with Postgres and in-memory backends
//! - **`auth`** - JWT verification and identity resolution
//! - **`middleware`** - Bearer token middleware and extractor
//! - **`error`** - Backend error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs       - Module exports and documentation
//! ├── server/      - Server initialization and state
//! ├── routes/      - Route configuration
//! ├── chat/        - Real-time chat
//! ├── messaging/   - REST handlers
//! ├── realtime/    - Fan-out primitives
//! ├── store/       - Persistence
//! ├── auth/        - Authentication
//! ├── middleware/  - Request middleware
//! └── error/       - Error types
//! ```
//!
//! # Thread Safety
//!
//! Shared state lives behind `Arc` with `tokio::sync::RwLock` inside the
//! registries. Each connection owns its outbound queue; a slow client only
//! loses its own events.

pub mod auth;
pub mod chat;
pub mod error;
pub mod messaging;
pub mod middleware;
pub mod realtime;
pub mod routes;
pub mod server;
pub mod store;

pub use error::ChatError;
pub use server::{create_app, AppState};
pub use store::{ChatStore, MemoryStore, PgChatStore};
