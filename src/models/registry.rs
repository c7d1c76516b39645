use crate::error::FederationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static registry entry identifying one remote data server: its endpoint,
/// the logical database it exposes, and the tables it owns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerDescriptor {
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub tables: Vec<String>,
}

impl ServerDescriptor {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database_name: impl Into<String>,
        tables: Vec<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            database_name: database_name.into(),
            tables,
        }
    }

    /// `host:port` form used when opening a channel.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn owns_table(&self, table: &str) -> bool {
        self.tables.iter().any(|t| t == table)
    }

    fn validate(&self) -> Result<(), FederationError> {
        if self.host.is_empty() {
            return Err(FederationError::Descriptor("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(FederationError::Descriptor("port must be non-zero".to_string()));
        }
        if self.database_name.is_empty() {
            return Err(FederationError::Descriptor(
                "database_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable set of known servers, in registration order.
///
/// Loaded once at startup and injected into the `Federator`; read-only for
/// the process lifetime, so it is safely shared across concurrent federated
/// calls without locking. Adding or removing servers requires a restart.
#[derive(Debug, Clone, Default)]
pub struct ServerRegistry {
    servers: Vec<ServerDescriptor>,
}

impl ServerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a server at startup. Fails fast on a descriptor missing its
    /// required fields; registration order is the tie-break order for
    /// tables owned by more than one server.
    pub fn register(&mut self, descriptor: ServerDescriptor) -> Result<(), FederationError> {
        descriptor.validate()?;
        self.servers.push(descriptor);
        Ok(())
    }

    pub fn from_descriptors(
        descriptors: Vec<ServerDescriptor>,
    ) -> Result<Self, FederationError> {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.register(descriptor)?;
        }
        Ok(registry)
    }

    /// Load a registry from a JSON file containing an array of descriptors.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FederationError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            FederationError::Descriptor(format!(
                "failed to read registry file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let descriptors: Vec<ServerDescriptor> = serde_json::from_str(&raw).map_err(|e| {
            FederationError::Descriptor(format!("malformed registry file: {}", e))
        })?;
        Self::from_descriptors(descriptors)
    }

    pub fn servers(&self) -> &[ServerDescriptor] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Every owner of `table`, paired with its registry index, in
    /// registration order.
    pub fn owners_of(&self, table: &str) -> Vec<(usize, &ServerDescriptor)> {
        self.servers
            .iter()
            .enumerate()
            .filter(|(_, s)| s.owns_table(table))
            .collect()
    }
}
