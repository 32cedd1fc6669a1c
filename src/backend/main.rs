/**
 * linkup Server Entry Point
 *
 * Loads configuration, opens the store and serves the chat endpoints.
 */

use linkup::backend::server::create_app;
use linkup::shared::ChatConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&env_filter))
        .init();

    let config = ChatConfig::load()?;
    let addr = config.bind_addr();

    let app = create_app(config).await;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
