//! Prepared statements bound to a database handle
//!
//! A [`Statement`] pairs a fixed SQL string with the adapter it runs on, so a
//! caller can hold it for its whole lifetime and execute it with different
//! parameters. Backends cache the compiled form keyed by the SQL text.

use crate::adapter::{SharedAdapter, SqlRow};
use crate::error::{SqlError, SqlResult};
use crate::value::SqlValue;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Write acknowledgment returned by [`Statement::run`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteResult {
    pub success: bool,
    pub meta: WriteMeta,
}

/// Metadata describing a completed write
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteMeta {
    /// Rows inserted, updated or deleted
    pub changes: u64,
    /// Rowid of the most recent successful insert on the connection, or
    /// `None` if it has never inserted. Updates and deletes do not change
    /// it, so their acknowledgments carry the rowid of an earlier insert.
    pub last_row_id: Option<i64>,
    /// Wall time spent executing, in milliseconds
    pub duration: f64,
}

/// A reusable parameterized statement
#[derive(Clone)]
pub struct Statement {
    db: SharedAdapter,
    sql: Arc<str>,
}

impl Statement {
    pub fn new(db: SharedAdapter, sql: impl Into<Arc<str>>) -> Self {
        Self {
            db,
            sql: sql.into(),
        }
    }

    /// Run the statement and return the first row, if any
    pub async fn first(&self, params: &[SqlValue]) -> SqlResult<Option<SqlRow>> {
        tracing::trace!(sql = %self.sql, "first");
        Ok(self.db.query(&self.sql, params).await?.into_first())
    }

    /// Run the statement for its side effects
    pub async fn run(&self, params: &[SqlValue]) -> SqlResult<WriteResult> {
        tracing::trace!(sql = %self.sql, "run");
        let started = Instant::now();
        let result = self.db.execute(&self.sql, params).await?;

        Ok(WriteResult {
            success: true,
            meta: WriteMeta {
                changes: result.rows_affected,
                last_row_id: result.last_insert_id,
                duration: started.elapsed().as_secs_f64() * 1000.0,
            },
        })
    }
}

/// Quote a table or column name for interpolation into SQL.
///
/// `schema.table` is split and each part quoted separately.
pub fn escape_identifier(name: &str) -> SqlResult<String> {
    if name.is_empty() || name.contains('\0') {
        return Err(SqlError::InvalidIdentifier(name.to_string()));
    }

    let quote = |part: &str| format!("\"{}\"", part.replace('"', "\"\""));
    if name.contains('.') {
        if name.split('.').any(str::is_empty) {
            return Err(SqlError::InvalidIdentifier(name.to_string()));
        }
        Ok(name.split('.').map(quote).collect::<Vec<_>>().join("."))
    } else {
        Ok(quote(name))
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("adapter", &self.db.adapter_type())
            .field("sql", &self.sql)
            .finish()
    }
}
