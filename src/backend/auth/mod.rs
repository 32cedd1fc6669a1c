//! Authentication Module
//!
//! Verifies the bearer credential a client presents and resolves it to a
//! user profile. Account creation and login live in the account service;
//! this server only trusts tokens signed with the shared secret.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs      - Module exports and documentation
//! ├── sessions.rs - JWT claims, signing and verification
//! └── gate.rs     - Credential to identity resolution
//! ```

/// JWT token generation and validation
pub mod sessions;

/// Connection gate
pub mod gate;

pub use gate::authenticate;
pub use sessions::{create_token, verify_token, Claims};
