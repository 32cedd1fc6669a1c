//! Route Configuration Module
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Main router creation
//! └── api_routes.rs - Authenticated conversation endpoints
//! ```
//!
//! # Routes
//!
//! - `GET /health`
//! - `GET /socket`
//! - `GET /api/chat/conversations`
//! - `GET /api/chat/conversation/user/{user_id}`
//! - `GET /api/chat/conversation/{conversation_id}`
//! - `GET /api/chat/conversation/{conversation_id}/messages`

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
