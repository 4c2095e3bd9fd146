//! tablekv SQL - database handle for the tablekv shim
//!
//! Provides the [`SqlAdapter`] abstraction the KV layer talks to, a
//! reusable prepared [`Statement`] wrapper, and a SQLite backend.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo() -> tablekv_sql::SqlResult<()> {
//! use std::sync::Arc;
//! use tablekv_sql::{SharedAdapter, SqlValue, SqliteAdapter, Statement};
//!
//! let db: SharedAdapter = Arc::new(SqliteAdapter::open(":memory:")?);
//! db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)", &[]).await?;
//!
//! let insert = Statement::new(db.clone(), "INSERT INTO t (name) VALUES (?)");
//! let ack = insert.run(&[SqlValue::from("Alice")]).await?;
//! assert_eq!(ack.meta.changes, 1);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod sqlite;
pub mod statement;

mod error;
mod value;

pub use adapter::{QueryResult, SharedAdapter, SqlAdapter, SqlRow};
pub use error::{SqlError, SqlResult};
pub use sqlite::SqliteAdapter;
pub use statement::{Statement, WriteMeta, WriteResult, escape_identifier};
pub use value::SqlValue;
