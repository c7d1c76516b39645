use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub federation: FederationConfig,
    pub logging: LoggingConfig,
}

/// Settings for the data-server process: where to listen and which logical
/// database it exposes.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub database_path: String,
}

/// Settings for the coordinator side.
#[derive(Debug, Clone, Deserialize)]
pub struct FederationConfig {
    /// JSON file holding the server registry (array of descriptors).
    pub registry_path: String,
    pub dispatch_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5555)?
            .set_default("server.database_name", "macro_nutrients")?
            .set_default("server.database_path", "./database/macro_nutrients.db")?
            .set_default("federation.registry_path", "./registry.json")?
            .set_default("federation.dispatch_timeout_secs", 5)?
            .set_default("logging.level", "info")?;

        // Load from environment variables
        if let Ok(host) = env::var("HOST") {
            builder = builder.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            builder = builder.set_override("server.port", port.parse::<u16>().unwrap_or(5555))?;
        }

        if let Ok(database_name) = env::var("DATABASE_NAME") {
            builder = builder.set_override("server.database_name", database_name)?;
        }

        if let Ok(database_path) = env::var("DATABASE_PATH") {
            builder = builder.set_override("server.database_path", database_path)?;
        }

        if let Ok(registry_path) = env::var("REGISTRY_PATH") {
            builder = builder.set_override("federation.registry_path", registry_path)?;
        }

        if let Ok(timeout_secs) = env::var("DISPATCH_TIMEOUT_SECS") {
            builder = builder.set_override(
                "federation.dispatch_timeout_secs",
                timeout_secs.parse::<u64>().unwrap_or(5),
            )?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        // Try to load from .env file
        let _ = dotenv::dotenv();

        builder.build()?.try_deserialize()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.federation.dispatch_timeout_secs)
    }
}
