use thiserror::Error;

/// Federation-layer error taxonomy
///
/// Every failure surfaced by `Federator::execute_federated` is one of these
/// kinds; nothing is downgraded to an empty result set or a printed message.
#[derive(Debug, Error)]
pub enum FederationError {
    /// The decomposer could not reduce the statement to a flat
    /// SELECT/FROM/WHERE. Raised before any dispatch occurs.
    #[error("SQL parse error: {0}")]
    Parse(String),

    /// A FROM-list table is owned by no registered server.
    #[error("routing error: {0}")]
    Routing(String),

    /// Channel could not be opened, the exchange failed mid-flight, or the
    /// per-dispatch timeout expired.
    #[error("transport error for server '{server}': {message}")]
    Transport { server: String, message: String },

    /// The server received the request but local execution failed. Carries
    /// the server's own error message verbatim.
    #[error("remote execution failed on '{server}': {message}")]
    RemoteExecution { server: String, message: String },

    /// A SELECT column is absent from the merged schema.
    #[error("projection error: column '{0}' not present in merged schema")]
    Projection(String),

    /// A server descriptor was rejected at registration time.
    #[error("invalid server descriptor: {0}")]
    Descriptor(String),
}

impl FederationError {
    /// Stable machine-readable code for presentation layers.
    pub fn code(&self) -> &'static str {
        match self {
            FederationError::Parse(_) => "PARSE_ERROR",
            FederationError::Routing(_) => "ROUTING_ERROR",
            FederationError::Transport { .. } => "TRANSPORT_ERROR",
            FederationError::RemoteExecution { .. } => "REMOTE_EXECUTION_ERROR",
            FederationError::Projection(_) => "PROJECTION_ERROR",
            FederationError::Descriptor(_) => "INVALID_DESCRIPTOR",
        }
    }

    pub fn transport(server: impl Into<String>, message: impl Into<String>) -> Self {
        FederationError::Transport {
            server: server.into(),
            message: message.into(),
        }
    }

    pub fn remote(server: impl Into<String>, message: impl Into<String>) -> Self {
        FederationError::RemoteExecution {
            server: server.into(),
            message: message.into(),
        }
    }
}
