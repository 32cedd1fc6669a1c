/**
 * Server Configuration
 *
 * Chooses the persistence backend for the configured environment.
 *
 * # Fallback
 *
 * A missing `DATABASE_URL` or an unreachable database does not prevent
 * startup. The server logs a warning and runs on the in-memory store, which
 * keeps everything until the process exits.
 */

use std::sync::Arc;

use crate::backend::store::{ChatStore, MemoryStore, PgChatStore};
use crate::shared::ChatConfig;

/// Connect the store named by the configuration
///
/// Connecting to Postgres also applies pending migrations.
pub async fn load_store(config: &ChatConfig) -> Arc<dyn ChatStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Using the in-memory store; data will not persist.");
        return Arc::new(MemoryStore::new());
    };

    tracing::info!("Connecting to database...");
    match PgChatStore::connect(database_url).await {
        Ok(store) => {
            tracing::info!("Database connected and migrations applied");
            Arc::new(store)
        }
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            tracing::warn!("Falling back to the in-memory store; data will not persist.");
            Arc::new(MemoryStore::new())
        }
    }
}
