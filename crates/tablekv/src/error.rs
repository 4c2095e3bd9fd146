//! KV error types

use tablekv_sql::SqlError;
use thiserror::Error;

/// Result type for KV operations
pub type KvResult<T> = Result<T, KvError>;

/// Error type for KV operations
#[derive(Debug, Error)]
pub enum KvError {
    /// A value kind the store has no text representation for
    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(&'static str),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Sql(#[from] SqlError),
}

impl From<std::convert::Infallible> for KvError {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}
