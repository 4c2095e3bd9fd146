//! tablekv - key-value store interface over an SQL table
//!
//! Stores string, JSON and binary values in a `(key, value, expires)` table
//! of any [`SqlAdapter`](tablekv_sql::SqlAdapter). Binary values pass through
//! base64; expired records are removed lazily on read.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo() -> tablekv::KvResult<()> {
//! use std::sync::Arc;
//! use tablekv::{GetOptions, KvAdapter, PutOptions, ValueType};
//! use tablekv_sql::SqliteAdapter;
//!
//! let db = Arc::new(SqliteAdapter::open(":memory:")?);
//! let kv = KvAdapter::new(db)?;
//! kv.initialize().await?;
//!
//! kv.put("session", "abc", PutOptions::expire_in(60.0)).await?;
//! let value = kv.get("session", GetOptions::default()).await?;
//! assert_eq!(value.and_then(|v| v.into_text()).as_deref(), Some("abc"));
//! assert!(kv.get("session", ValueType::Json.into()).await.is_err());
//! kv.delete("session").await?;
//! # Ok(())
//! # }
//! ```

mod adapter;
pub mod codec;
mod error;
mod value;

pub use adapter::{Clock, DEFAULT_TABLE, KvAdapter};
pub use error::{KvError, KvResult};
pub use value::{
    GetOptions, KvValue, NEVER_EXPIRES, PutOptions, PutValue, TextStream, ValueType,
};
