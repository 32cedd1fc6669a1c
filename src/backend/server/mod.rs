//! Server Module
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - Store selection
//! └── init.rs   - App creation
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use linkup::backend::server::create_app;
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

/// Application state management
pub mod state;

/// Store selection
pub mod config;

/// Server initialization
pub mod init;

pub use init::{create_app, create_app_with_store};
pub use state::AppState;
