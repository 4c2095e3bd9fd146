//! SQL error types

use thiserror::Error;

pub type SqlResult<T> = Result<T, SqlError>;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("SQLite error: {message}")]
    Sqlite { message: String, code: Option<i32> },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SqlError {
    pub fn sqlite(err: rusqlite::Error) -> Self {
        SqlError::Sqlite {
            message: err.to_string(),
            code: err.sqlite_error().map(|e| e.extended_code),
        }
    }
}

impl From<rusqlite::Error> for SqlError {
    fn from(err: rusqlite::Error) -> Self {
        SqlError::sqlite(err)
    }
}

impl From<tokio::task::JoinError> for SqlError {
    fn from(err: tokio::task::JoinError) -> Self {
        SqlError::Query(format!("Task join error: {}", err))
    }
}
