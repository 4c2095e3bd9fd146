//! SQL adapter trait for database access
//!
//! This module defines the database handle the KV layer is injected with.
//! SQLite is the bundled backend; tests substitute their own implementations.

use crate::error::SqlResult;
use crate::value::SqlValue;
use async_trait::async_trait;
use std::sync::Arc;

/// A row returned from a SQL query
#[derive(Debug, Clone)]
pub struct SqlRow {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl SqlRow {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    /// Remove a column's value from the row, leaving `Null` in its place
    pub fn take(&mut self, column: &str) -> Option<SqlValue> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.values
            .get_mut(index)
            .map(|v| std::mem::replace(v, SqlValue::Null))
    }
}

/// Query result from a database operation
#[derive(Debug, Default)]
pub struct QueryResult {
    pub rows: Vec<SqlRow>,
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

impl QueryResult {
    pub fn new(rows: Vec<SqlRow>) -> Self {
        Self {
            rows,
            rows_affected: 0,
            last_insert_id: None,
        }
    }

    pub fn with_affected(rows_affected: u64) -> Self {
        Self {
            rows: Vec::new(),
            rows_affected,
            last_insert_id: None,
        }
    }

    pub fn with_last_insert_id(mut self, id: Option<i64>) -> Self {
        self.last_insert_id = id;
        self
    }

    /// First row of the result, consuming it
    pub fn into_first(self) -> Option<SqlRow> {
        self.rows.into_iter().next()
    }
}

/// Core trait for SQL database handles
///
/// Parameters bind positionally to `?` placeholders.
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    /// Get the adapter type name
    fn adapter_type(&self) -> &'static str;

    /// Execute a query and return its rows
    async fn query(&self, sql: &str, params: &[SqlValue]) -> SqlResult<QueryResult>;

    /// Execute a statement and return the affected row count and last rowid
    async fn execute(&self, sql: &str, params: &[SqlValue]) -> SqlResult<QueryResult>;
}

/// Shared adapter instance
pub type SharedAdapter = Arc<dyn SqlAdapter>;
