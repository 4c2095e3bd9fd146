//! SQLite adapter implementation
//!
//! Provides a SQLite backend using rusqlite with async support via spawn_blocking.
//! Statements go through rusqlite's prepared statement cache, so a handful of
//! fixed SQL strings executed repeatedly are compiled once per connection.

mod types;

use crate::adapter::{QueryResult, SqlAdapter, SqlRow};
use crate::error::{SqlError, SqlResult};
use crate::value::SqlValue;
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::sync::Arc;

/// SQLite database connection
pub struct SqliteAdapter {
    conn: Arc<Mutex<Connection>>,
    path: String,
}

impl SqliteAdapter {
    /// Open a SQLite database
    ///
    /// # Arguments
    /// * `path` - Database path. Use `:memory:` for in-memory database,
    ///           or a file path (optionally with `sqlite://` prefix)
    pub fn open(path: &str) -> SqlResult<Self> {
        let normalized_path = normalize_path(path);
        let conn = if normalized_path == ":memory:" {
            Connection::open_in_memory()
        } else {
            if let Some(parent) = Path::new(&normalized_path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
            Connection::open_with_flags(&normalized_path, flags)
        }
        .map_err(|e| SqlError::Connection(e.to_string()))?;

        // Enable WAL mode for better concurrency
        if normalized_path != ":memory:" {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
                .map_err(SqlError::sqlite)?;
        }

        tracing::debug!(path = %normalized_path, "opened sqlite database");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: normalized_path,
        })
    }

    /// Normalized path this database was opened with
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Execute a query and return results (sync, internal)
    fn query_sync(conn: &Connection, sql: &str, params: &[SqlValue]) -> SqlResult<QueryResult> {
        let mut stmt = conn.prepare_cached(sql).map_err(SqlError::sqlite)?;

        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let column_count = column_names.len();

        let rows_result: Result<Vec<SqlRow>, rusqlite::Error> = stmt
            .query(rusqlite::params_from_iter(
                params.iter().map(types::to_rusqlite_value),
            ))?
            .mapped(|row| {
                let mut values = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    values.push(types::from_rusqlite_value(row, i));
                }
                Ok(SqlRow::new(column_names.clone(), values))
            })
            .collect();

        Ok(QueryResult::new(rows_result.map_err(SqlError::sqlite)?))
    }

    /// Execute a statement (sync, internal)
    fn execute_sync(conn: &Connection, sql: &str, params: &[SqlValue]) -> SqlResult<QueryResult> {
        let mut stmt = conn.prepare_cached(sql).map_err(SqlError::sqlite)?;

        let rows_affected = stmt
            .execute(rusqlite::params_from_iter(
                params.iter().map(types::to_rusqlite_value),
            ))
            .map_err(SqlError::sqlite)?;

        let last_insert_id = match conn.last_insert_rowid() {
            0 => None,
            id => Some(id),
        };

        Ok(QueryResult::with_affected(rows_affected as u64).with_last_insert_id(last_insert_id))
    }
}

#[async_trait]
impl SqlAdapter for SqliteAdapter {
    fn adapter_type(&self) -> &'static str {
        "sqlite"
    }

    async fn query(&self, sql: &str, params: &[SqlValue]) -> SqlResult<QueryResult> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            Self::query_sync(&conn, &sql, &params)
        })
        .await?
    }

    async fn execute(&self, sql: &str, params: &[SqlValue]) -> SqlResult<QueryResult> {
        let conn = self.conn.clone();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            Self::execute_sync(&conn, &sql, &params)
        })
        .await?
    }
}

/// Normalize a database path
fn normalize_path(path: &str) -> String {
    if path == ":memory:" {
        return path.to_string();
    }

    // Strip sqlite:// prefix if present
    let path = path
        .strip_prefix("sqlite://")
        .or_else(|| path.strip_prefix("sqlite:"))
        .unwrap_or(path);

    path.to_string()
}
