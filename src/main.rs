use agrifed::config::Config;
use agrifed::server::DataServer;
use agrifed::storage::SqliteStore;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging; the environment wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(&config.logging.level)
            }),
        )
        .init();

    info!(
        "Starting data server '{}' on {}",
        config.server.database_name,
        config.server_address()
    );

    // Open the local store this server exposes
    let store = SqliteStore::open(&config.server.database_path).map_err(|e| {
        error!(
            "Failed to open database {}: {}",
            config.server.database_path, e
        );
        e
    })?;

    let data_server = Arc::new(DataServer::new(
        config.server.database_name.clone(),
        Arc::new(store),
    ));

    // Serve until the process is stopped; only a bind failure returns.
    data_server.serve(&config.server_address()).await?;

    Ok(())
}
