//! Middleware Module
//!
//! Request processing that runs before the REST handlers.
//!
//! - **`auth`** - Bearer-token authentication for `/api/chat`

pub mod auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
