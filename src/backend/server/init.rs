/**
 * Server Initialization
 *
 * # Initialization Process
 *
 * 1. Open the store (Postgres, or memory as a fallback)
 * 2. Build `AppState` around it
 * 3. Create the router
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_store;
use crate::backend::server::state::AppState;
use crate::backend::store::ChatStore;
use crate::shared::ChatConfig;

/// Create and configure the Axum application
pub async fn create_app(config: ChatConfig) -> Router<()> {
    tracing::info!("Initializing linkup chat server");
    let store = load_store(&config).await;
    create_app_with_store(config, store)
}

/// Build the application around an already opened store
pub fn create_app_with_store(config: ChatConfig, store: Arc<dyn ChatStore>) -> Router<()> {
    let app_state = AppState::new(config, store);
    tracing::info!(
        presence_debounce_ms = app_state.config.presence_debounce.as_millis() as u64,
        "Application state initialized"
    );
    create_router(app_state)
}
