pub mod config;
pub mod decomposer;
pub mod error;
pub mod federation;
pub mod models;
pub mod protocol;
pub mod render;
pub mod server;
pub mod storage;

pub use decomposer::QueryDecomposer;
pub use error::FederationError;
pub use federation::{Federator, TableBatch};
pub use models::*;
pub use protocol::{QueryRequest, QueryResponse};
pub use server::DataServer;
pub use storage::{QueryStore, SqliteStore};
