//! tablekv server - HTTP routes over a [`KvAdapter`](tablekv::KvAdapter)
//!
//! | Path | Query | Response |
//! |---|---|---|
//! | `/kv` | `key` | JSON value or `null` |
//! | `/kv/put` | `key`, `value` | JSON write acknowledgment |
//! | `/kv/delete` | `key` | JSON write acknowledgment |
//!
//! Anything else is a 404 `Not found`; failures are a 500 carrying the
//! error message.

pub mod config;
pub mod routes;
pub mod server;

pub use config::{Config, load_config};
pub use routes::AppState;
