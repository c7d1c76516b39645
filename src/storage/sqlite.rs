use crate::models::Row;
use crate::storage::{QueryStore, StoreError, StoreResult};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// SQLite-backed store for one logical database.
///
/// Uses tokio::Mutex so concurrent connection handlers serialize access to
/// the single `rusqlite::Connection`, per the store's own concurrency
/// contract.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a script of semicolon-separated statements. Used for schema
    /// setup and test fixtures, not by the serve loop.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), rusqlite::Error> {
        let conn = self.conn.lock().await;
        conn.execute_batch(sql)
    }

    fn value_to_json(value: ValueRef<'_>) -> Value {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::from(i),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
            // Blobs are not part of the wire scalar set; render lossily.
            ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

#[async_trait]
impl QueryStore for SqliteStore {
    async fn execute(&self, sql: &str) -> Result<StoreResult, StoreError> {
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare(sql).map_err(|e| StoreError(e.to_string()))?;
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut rows = stmt.query([]).map_err(|e| StoreError(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| StoreError(e.to_string()))? {
            let mut obj = Row::new();
            for (idx, column) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(|e| StoreError(e.to_string()))?;
                obj.insert(column.clone(), Self::value_to_json(value));
            }
            out.push(obj);
        }

        Ok(StoreResult { columns, rows: out })
    }
}
