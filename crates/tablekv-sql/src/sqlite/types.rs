//! SQLite type conversion utilities

use crate::value::SqlValue;
use rusqlite::Row;
use rusqlite::types::{ToSqlOutput, Value as RusqliteValue, ValueRef};

/// Borrowing wrapper so parameters bind without cloning
pub struct SqliteParam<'a>(&'a SqlValue);

impl rusqlite::ToSql for SqliteParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            SqlValue::Null => ToSqlOutput::Owned(RusqliteValue::Null),
            SqlValue::Int(i) => ToSqlOutput::Owned(RusqliteValue::Integer(*i)),
            SqlValue::Float(f) => ToSqlOutput::Owned(RusqliteValue::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

/// Convert SqlValue to a rusqlite parameter
pub fn to_rusqlite_value(value: &SqlValue) -> SqliteParam<'_> {
    SqliteParam(value)
}

/// Convert rusqlite row value to SqlValue
pub fn from_rusqlite_value(row: &Row, index: usize) -> SqlValue {
    match row.get_ref(index) {
        Ok(ValueRef::Null) => SqlValue::Null,
        Ok(ValueRef::Integer(i)) => SqlValue::Int(i),
        Ok(ValueRef::Real(f)) => SqlValue::Float(f),
        Ok(ValueRef::Text(s)) => SqlValue::Text(String::from_utf8_lossy(s).into_owned()),
        Ok(ValueRef::Blob(b)) => SqlValue::Blob(b.to_vec()),
        Err(_) => SqlValue::Null,
    }
}
