//! LinkUp - Real-time Chat Server
//!
//! One-on-one chat between friends over a persistent WebSocket, with online
//! presence, read receipts and typing indicators, backed by Postgres or an
//! in-memory store.
//!
//! # Module Structure
//!
//! - **`shared`** - Domain types, the event protocol, configuration
//! - **`backend`** - Server-side code (only compiled with the `server` feature)
//!   - Connection gate and JWT verification
//!   - Room hub and presence registry
//!   - Chat event handlers and REST endpoints
//!   - Persistence behind the `ChatStore` trait
//!
//! # Usage
//!
//! ```rust,no_run
//! use linkup::backend::server::init::create_app;
//! use linkup::shared::ChatConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ChatConfig::load()?;
//! let addr = config.bind_addr();
//! let app = create_app(config).await;
//! let listener = tokio::net::TcpListener::bind(addr).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! All server state is shared behind `Arc` with `tokio::sync` locks. Each
//! connection owns a bounded outbound queue drained by its own writer task.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "server")]
pub mod backend;
