use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result row: column name to scalar value (null, number, string, bool).
pub type Row = serde_json::Map<String, Value>;

/// Final, caller-visible combined query result.
///
/// Owned solely by the call that produced it; row order is the dispatch
/// concatenation order (route-plan order, then row order within each
/// server's batch). No re-sorting is performed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FederatedResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl FederatedResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
