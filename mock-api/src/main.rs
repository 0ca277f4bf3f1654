//! Mock API - development stand-in for the calendar backend on port 3001.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use mock_api::routes::describe_routes;
use mock_api::{router, JsonStore, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .json()
        .init();

    let config = ServerConfig::from_env();
    let store = Arc::new(JsonStore::open(&config.db_path).await?);

    for route in describe_routes(&store.collections().await) {
        info!("{}", route);
    }

    let app = router(store);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Mock API is running on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
