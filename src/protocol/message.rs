use crate::models::Row;
use serde::{Deserialize, Serialize};

/// Request message, coordinator to server: `{"query": "<SQL text>"}`.
/// Servers interpret no other fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub query: String,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// The whole-table fetch the coordinator sends per routed table.
    pub fn full_table(table: &str) -> Self {
        Self::new(format!("SELECT * FROM {}", table))
    }
}

/// Response message, server to coordinator.
///
/// Exactly one of `data`/`error` is populated. `columns` travels with
/// `data` so an empty result set still carries its schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QueryResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn success(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            data: Some(rows),
            columns: Some(columns),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            columns: None,
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
