//! KV adapter over a single SQL table
//!
//! Each record is one row of `(key, value, expires)`. Expired rows are never
//! swept; a `get` that finds one reports a miss and deletes the row in a
//! background task. That delete only matches the `expires` the read saw, so
//! a record rewritten in the meantime survives it.

use crate::error::{KvError, KvResult};
use crate::value::{GetOptions, KvValue, NEVER_EXPIRES, PutOptions, PutValue};
use parking_lot::Mutex;
use tablekv_sql::{SharedAdapter, SqlValue, Statement, WriteResult, escape_identifier};
use tokio::task::JoinHandle;

/// Table used when none is configured
pub const DEFAULT_TABLE: &str = "KV";

/// Source of the current time in epoch milliseconds
pub type Clock = fn() -> i64;

/// Key-value view of one table in an injected database
pub struct KvAdapter {
    db: SharedAdapter,
    table: String,
    fetch: Statement,
    upsert: Statement,
    remove: Statement,
    expire: Statement,
    clock: Clock,
    cleanups: Mutex<Vec<JoinHandle<()>>>,
}

impl KvAdapter {
    /// Bind to the default `KV` table
    pub fn new(db: SharedAdapter) -> KvResult<Self> {
        Self::with_table(db, DEFAULT_TABLE)
    }

    /// Bind to `table`, preparing the fetch, upsert and delete statements
    pub fn with_table(db: SharedAdapter, table: &str) -> KvResult<Self> {
        let ident = escape_identifier(table)?;

        let fetch = Statement::new(
            db.clone(),
            format!("SELECT value, expires FROM {ident} WHERE key = ?"),
        );
        let upsert = Statement::new(
            db.clone(),
            format!(
                "INSERT INTO {ident} (key, value, expires) VALUES (?, ?, ?) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires = excluded.expires"
            ),
        );
        let remove = Statement::new(db.clone(), format!("DELETE FROM {ident} WHERE key = ?"));
        let expire = Statement::new(
            db.clone(),
            format!("DELETE FROM {ident} WHERE key = ? AND expires IS ?"),
        );

        Ok(Self {
            db,
            table: table.to_string(),
            fetch,
            upsert,
            remove,
            expire,
            clock: now_millis,
            cleanups: Mutex::new(Vec::new()),
        })
    }

    /// Replace the wall clock used for expiry decisions
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the backing table if it does not exist yet
    pub async fn initialize(&self) -> KvResult<()> {
        let ident = escape_identifier(&self.table)?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {ident} (key TEXT PRIMARY KEY, value TEXT, expires INTEGER)"
        );
        self.db.execute(&sql, &[]).await?;
        Ok(())
    }

    /// Look up `key`
    ///
    /// Records stored without an expiry come back as [`KvValue::Text`]
    /// whatever type was requested; only records with a future expiry are
    /// decoded per `options`.
    pub async fn get(&self, key: &str, options: GetOptions) -> KvResult<Option<KvValue>> {
        check_key(key)?;

        let Some(mut row) = self.fetch.first(&[SqlValue::from(key)]).await? else {
            return Ok(None);
        };

        let observed = row.take("expires").unwrap_or(SqlValue::Null);
        let expires = observed.as_i64();
        let now = (self.clock)();
        let live = match expires {
            Some(NEVER_EXPIRES) => false,
            Some(at) if at > now => true,
            _ => {
                tracing::debug!(key, ?expires, now, "record expired");
                self.spawn_cleanup(key, observed);
                return Ok(None);
            }
        };

        let Some(stored) = row.take("value").and_then(SqlValue::into_text) else {
            return Ok(None);
        };

        if live {
            KvValue::decode(stored, options.value_type).map(Some)
        } else {
            Ok(Some(KvValue::Text(stored)))
        }
    }

    /// Insert or replace the record for `key`
    pub async fn put<V>(&self, key: &str, value: V, options: PutOptions) -> KvResult<WriteResult>
    where
        V: TryInto<PutValue>,
        KvError: From<V::Error>,
    {
        check_key(key)?;

        let value: PutValue = value.try_into()?;
        let stored = value.into_stored()?;
        let expires = options.expires_at((self.clock)());

        tracing::debug!(key, expires, "put");
        Ok(self
            .upsert
            .run(&[SqlValue::from(key), SqlValue::from(stored), SqlValue::from(expires)])
            .await?)
    }

    /// Remove the record for `key`, if any
    pub async fn delete(&self, key: &str) -> KvResult<WriteResult> {
        check_key(key)?;
        Ok(self.remove.run(&[SqlValue::from(key)]).await?)
    }

    /// Wait for every expiry cleanup this adapter has started
    pub async fn settle(&self) {
        let handles = std::mem::take(&mut *self.cleanups.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "expiry cleanup task aborted");
            }
        }
    }

    fn spawn_cleanup(&self, key: &str, expires: SqlValue) {
        let expire = self.expire.clone();
        let key = key.to_string();

        let handle = tokio::spawn(async move {
            match expire.run(&[SqlValue::from(key.as_str()), expires]).await {
                Ok(_) => tracing::debug!(key = %key, "removed expired record"),
                Err(e) => tracing::warn!(key = %key, error = %e, "failed to remove expired record"),
            }
        });

        let mut cleanups = self.cleanups.lock();
        cleanups.retain(|h| !h.is_finished());
        cleanups.push(handle);
    }
}

impl std::fmt::Debug for KvAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvAdapter")
            .field("adapter", &self.db.adapter_type())
            .field("table", &self.table)
            .finish()
    }
}

fn check_key(key: &str) -> KvResult<()> {
    if key.is_empty() {
        return Err(KvError::InvalidKey("key must not be empty".into()));
    }
    Ok(())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueType;
    use serde_json::json;
    use std::sync::Arc;
    use tablekv_sql::SqliteAdapter;

    async fn setup() -> (SharedAdapter, KvAdapter) {
        let db: SharedAdapter = Arc::new(SqliteAdapter::open(":memory:").unwrap());
        let kv = KvAdapter::new(db.clone()).unwrap();
        kv.initialize().await.unwrap();
        (db, kv)
    }

    async fn row_count(db: &SharedAdapter, key: &str) -> i64 {
        let result = db
            .query(
                "SELECT COUNT(*) AS n FROM KV WHERE key = ?",
                &[SqlValue::from(key)],
            )
            .await
            .unwrap();
        result.rows[0].get("n").and_then(SqlValue::as_i64).unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_db, kv) = setup().await;

        kv.put("greeting", "hello", PutOptions::default())
            .await
            .unwrap();
        let value = kv.get("greeting", GetOptions::default()).await.unwrap();
        assert_eq!(value.unwrap().into_text().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let (_db, kv) = setup().await;
        assert!(kv.get("nope", GetOptions::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (_db, kv) = setup().await;
        kv.put("a", "1", PutOptions::default()).await.unwrap();
        kv.initialize().await.unwrap();
        kv.initialize().await.unwrap();
        assert!(kv.get("a", GetOptions::default()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let (db, kv) = setup().await;

        kv.put("k", "v1", PutOptions::default()).await.unwrap();
        kv.put("k", "v2", PutOptions::default()).await.unwrap();

        let value = kv.get("k", GetOptions::default()).await.unwrap().unwrap();
        assert_eq!(value.as_text(), Some("v2"));
        assert_eq!(row_count(&db, "k").await, 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (db, kv) = setup().await;

        let ack = kv.delete("ghost").await.unwrap();
        assert!(ack.success);
        assert_eq!(ack.meta.changes, 0);

        kv.put("k", "v", PutOptions::default()).await.unwrap();
        assert_eq!(kv.delete("k").await.unwrap().meta.changes, 1);
        assert_eq!(row_count(&db, "k").await, 0);
    }

    #[tokio::test]
    async fn test_expired_record_is_a_miss_and_removed() {
        let (db, kv) = setup().await;

        kv.put("old", "stale", PutOptions::expire_at(1.0))
            .await
            .unwrap();
        assert_eq!(row_count(&db, "old").await, 1);

        assert!(kv.get("old", GetOptions::default()).await.unwrap().is_none());
        kv.settle().await;

        assert_eq!(row_count(&db, "old").await, 0);
        assert!(kv.get("old", GetOptions::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rewrite_after_expired_read_survives_cleanup() {
        let (_db, kv) = setup().await;

        for round in 0..50 {
            let fresh = format!("fresh-{round}");
            kv.put("k", "stale", PutOptions::expire_at(1.0))
                .await
                .unwrap();
            assert!(kv.get("k", GetOptions::default()).await.unwrap().is_none());

            kv.put("k", fresh.as_str(), PutOptions::default())
                .await
                .unwrap();
            kv.settle().await;

            let value = kv.get("k", GetOptions::default()).await.unwrap();
            assert_eq!(value.and_then(KvValue::into_text), Some(fresh));
        }
    }

    #[tokio::test]
    async fn test_null_expires_is_cleaned_up() {
        let (db, kv) = setup().await;
        db.execute(
            "INSERT INTO KV (key, value, expires) VALUES (?, ?, NULL)",
            &[SqlValue::from("k"), SqlValue::from("v")],
        )
        .await
        .unwrap();

        assert!(kv.get("k", GetOptions::default()).await.unwrap().is_none());
        kv.settle().await;
        assert_eq!(row_count(&db, "k").await, 0);
    }

    fn fixed_clock() -> i64 {
        1_000_000
    }

    #[tokio::test]
    async fn test_expiry_boundary() {
        let (db, _) = setup().await;
        let kv = KvAdapter::new(db).unwrap().with_clock(fixed_clock);

        kv.put("edge", "v", PutOptions::expire_at(1_000_000.0))
            .await
            .unwrap();
        assert!(kv.get("edge", GetOptions::default()).await.unwrap().is_none());

        kv.put("next", "v", PutOptions::expire_at(1_000_001.0))
            .await
            .unwrap();
        let value = kv.get("next", GetOptions::default()).await.unwrap();
        assert_eq!(value.and_then(KvValue::into_text).as_deref(), Some("v"));
        kv.settle().await;
    }

    #[tokio::test]
    async fn test_ttl_counts_from_clock() {
        let (db, _) = setup().await;
        let kv = KvAdapter::new(db.clone()).unwrap().with_clock(fixed_clock);

        kv.put("k", "v", PutOptions::expire_in(1.5)).await.unwrap();

        let result = db
            .query("SELECT expires FROM KV WHERE key = ?", &[SqlValue::from("k")])
            .await
            .unwrap();
        assert_eq!(
            result.rows[0].get("expires").and_then(SqlValue::as_i64),
            Some(1_001_500)
        );
    }

    #[tokio::test]
    async fn test_live_record_decodes_per_type() {
        let (_db, kv) = setup().await;
        let ttl = PutOptions::expire_in(3600.0);

        kv.put("doc", json!({"n": 1}), ttl).await.unwrap();
        let value = kv.get("doc", ValueType::Json.into()).await.unwrap().unwrap();
        assert!(matches!(value, KvValue::Json(v) if v == json!({"n": 1})));

        kv.put("bin", vec![0u8, 159, 255], ttl).await.unwrap();
        let value = kv
            .get("bin", ValueType::ArrayBuffer.into())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(value, KvValue::ArrayBuffer(b) if b == [0u8, 159, 255]));
    }

    #[tokio::test]
    async fn test_permanent_record_skips_decoding() {
        let (_db, kv) = setup().await;

        kv.put("doc", json!({"n": 1}), PutOptions::default())
            .await
            .unwrap();
        let value = kv.get("doc", ValueType::Json.into()).await.unwrap().unwrap();
        assert_eq!(value.as_text(), Some(r#"{"n":1}"#));

        kv.put("bin", b"hi".as_slice(), PutOptions::default())
            .await
            .unwrap();
        let value = kv
            .get("bin", ValueType::ArrayBuffer.into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value.as_text(), Some("aGk="));
    }

    #[tokio::test]
    async fn test_unsupported_value_writes_nothing() {
        let (db, kv) = setup().await;

        let err = kv
            .put("flag", json!(true), PutOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, KvError::UnsupportedValueType(_)));
        assert_eq!(row_count(&db, "flag").await, 0);
    }

    #[tokio::test]
    async fn test_empty_key_rejected() {
        let (_db, kv) = setup().await;
        assert!(matches!(
            kv.put("", "v", PutOptions::default()).await,
            Err(KvError::InvalidKey(_))
        ));
        assert!(matches!(
            kv.get("", GetOptions::default()).await,
            Err(KvError::InvalidKey(_))
        ));
        assert!(matches!(kv.delete("").await, Err(KvError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_custom_table() {
        let db: SharedAdapter = Arc::new(SqliteAdapter::open(":memory:").unwrap());
        let kv = KvAdapter::with_table(db.clone(), "cache entries").unwrap();
        kv.initialize().await.unwrap();
        kv.put("a", "1", PutOptions::default()).await.unwrap();

        let result = db
            .query("SELECT value FROM \"cache entries\"", &[])
            .await
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert!(KvAdapter::with_table(db, "").is_err());
    }
}
