pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::models::Row;
use async_trait::async_trait;
use thiserror::Error;

/// Result of one local query execution: the result schema plus the rows in
/// the order the store returned them.
#[derive(Debug, Clone, Default)]
pub struct StoreResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Local execution failure (malformed SQL, missing table, type error).
/// Forwarded verbatim as the wire response's `error` field; never mixed
/// with partial row data.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Abstraction over the embedded relational store a data server wraps.
/// The store is assumed to support arbitrary read queries.
#[async_trait]
pub trait QueryStore: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<StoreResult, StoreError>;
}
