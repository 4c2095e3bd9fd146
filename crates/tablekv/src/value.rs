//! Values going into and coming out of the store

use crate::codec;
use crate::error::{KvError, KvResult};
use bytes::Bytes;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Sentinel stored in `expires` for records that never expire
pub const NEVER_EXPIRES: i64 = -1;

/// How `get` should interpret the stored text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    #[default]
    Text,
    Json,
    ArrayBuffer,
    Stream,
}

/// Options for [`KvAdapter::get`](crate::KvAdapter::get)
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    pub value_type: ValueType,
}

impl GetOptions {
    pub fn new(value_type: ValueType) -> Self {
        Self { value_type }
    }
}

impl From<ValueType> for GetOptions {
    fn from(value_type: ValueType) -> Self {
        Self::new(value_type)
    }
}

/// Options for [`KvAdapter::put`](crate::KvAdapter::put)
///
/// `expiration` is an absolute epoch timestamp in milliseconds and wins over
/// `expiration_ttl`, which counts seconds from the time of the write.
#[derive(Debug, Clone, Copy, Default)]
pub struct PutOptions {
    pub expiration: Option<f64>,
    pub expiration_ttl: Option<f64>,
}

impl PutOptions {
    pub fn expire_at(millis: f64) -> Self {
        Self {
            expiration: Some(millis),
            expiration_ttl: None,
        }
    }

    pub fn expire_in(seconds: f64) -> Self {
        Self {
            expiration: None,
            expiration_ttl: Some(seconds),
        }
    }

    /// Stored `expires` column for a write happening at `now_ms`.
    ///
    /// Any `expiration` that is set wins, including `0`. Halves round up
    /// toward positive infinity, so `-1.5` lands on [`NEVER_EXPIRES`].
    pub fn expires_at(&self, now_ms: i64) -> i64 {
        if let Some(at) = self.expiration {
            round_half_up(at)
        } else if let Some(ttl) = self.expiration_ttl {
            round_half_up(now_ms as f64 + ttl * 1000.0)
        } else {
            NEVER_EXPIRES
        }
    }
}

fn round_half_up(millis: f64) -> i64 {
    (millis + 0.5).floor() as i64
}

/// A value accepted by `put`
#[derive(Debug, Clone, PartialEq)]
pub enum PutValue {
    /// Stored verbatim
    Text(String),
    /// Stored as base64
    Binary(Bytes),
    /// Stored as serialized JSON
    Structured(JsonValue),
}

impl PutValue {
    /// Serialize any value into its JSON form and classify it.
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> KvResult<Self> {
        Self::try_from(serde_json::to_value(value)?)
    }

    /// Text written to the `value` column.
    pub fn into_stored(self) -> KvResult<String> {
        match self {
            PutValue::Text(text) => Ok(text),
            PutValue::Binary(bytes) => Ok(codec::encode_binary(&bytes)),
            PutValue::Structured(json) => Ok(serde_json::to_string(&json)?),
        }
    }
}

impl From<String> for PutValue {
    fn from(text: String) -> Self {
        PutValue::Text(text)
    }
}

impl From<&str> for PutValue {
    fn from(text: &str) -> Self {
        PutValue::Text(text.to_string())
    }
}

impl From<Bytes> for PutValue {
    fn from(bytes: Bytes) -> Self {
        PutValue::Binary(bytes)
    }
}

impl From<Vec<u8>> for PutValue {
    fn from(bytes: Vec<u8>) -> Self {
        PutValue::Binary(Bytes::from(bytes))
    }
}

impl From<&[u8]> for PutValue {
    fn from(bytes: &[u8]) -> Self {
        PutValue::Binary(Bytes::copy_from_slice(bytes))
    }
}

impl TryFrom<JsonValue> for PutValue {
    type Error = KvError;

    fn try_from(value: JsonValue) -> KvResult<Self> {
        match value {
            JsonValue::String(text) => Ok(PutValue::Text(text)),
            JsonValue::Bool(_) => Err(KvError::UnsupportedValueType("boolean")),
            other => Ok(PutValue::Structured(other)),
        }
    }
}

/// A value returned by `get`
pub enum KvValue {
    Text(String),
    Json(JsonValue),
    ArrayBuffer(Vec<u8>),
    Stream(TextStream),
}

impl KvValue {
    /// Interpret stored text according to the requested type.
    pub fn decode(stored: String, value_type: ValueType) -> KvResult<Self> {
        Ok(match value_type {
            ValueType::Text => KvValue::Text(stored),
            ValueType::Json => KvValue::Json(serde_json::from_str(&stored)?),
            ValueType::ArrayBuffer => KvValue::ArrayBuffer(codec::decode_binary(&stored)?),
            // handed out as text, not base64-decoded
            ValueType::Stream => KvValue::Stream(TextStream::once(stored)),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            KvValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            KvValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// JSON rendering used for HTTP responses. Streams are drained.
    pub async fn into_json(self) -> JsonValue {
        match self {
            KvValue::Text(text) => JsonValue::String(text),
            KvValue::Json(json) => json,
            KvValue::ArrayBuffer(bytes) => {
                JsonValue::Array(bytes.into_iter().map(JsonValue::from).collect())
            }
            KvValue::Stream(stream) => JsonValue::String(stream.read_to_string().await),
        }
    }
}

impl std::fmt::Debug for KvValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KvValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            KvValue::Json(json) => f.debug_tuple("Json").field(json).finish(),
            KvValue::ArrayBuffer(bytes) => f.debug_tuple("ArrayBuffer").field(bytes).finish(),
            KvValue::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Lazy byte stream over a stored value
pub struct TextStream(BoxStream<'static, Bytes>);

impl TextStream {
    /// Stream yielding `text` as its only chunk.
    pub fn once(text: String) -> Self {
        Self(stream::once(async move { Bytes::from(text) }).boxed())
    }

    pub async fn read_to_string(mut self) -> String {
        let mut buf = Vec::new();
        while let Some(chunk) = self.0.next().await {
            buf.extend_from_slice(&chunk);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Stream for TextStream {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        self.0.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expiry_precedence() {
        let now = 1_000_000;
        assert_eq!(PutOptions::default().expires_at(now), NEVER_EXPIRES);
        assert_eq!(PutOptions::expire_in(60.0).expires_at(now), 1_060_000);
        assert_eq!(PutOptions::expire_at(5_000.4).expires_at(now), 5_000);

        let both = PutOptions {
            expiration: Some(42.0),
            expiration_ttl: Some(60.0),
        };
        assert_eq!(both.expires_at(now), 42);
    }

    #[test]
    fn test_expiry_rounding() {
        assert_eq!(PutOptions::expire_in(0.0015).expires_at(0), 2);
        assert_eq!(PutOptions::expire_in(0.0014).expires_at(0), 1);
        assert_eq!(PutOptions::expire_at(9.6).expires_at(0), 10);
        assert_eq!(PutOptions::expire_at(2.5).expires_at(0), 3);
        assert_eq!(PutOptions::expire_at(-2.5).expires_at(0), -2);
        assert_eq!(PutOptions::expire_at(-1.5).expires_at(0), NEVER_EXPIRES);
    }

    #[test]
    fn test_zero_expiration_is_honored() {
        let zero = PutOptions {
            expiration: Some(0.0),
            expiration_ttl: Some(60.0),
        };
        assert_eq!(zero.expires_at(1_000_000), 0);
        assert_eq!(PutOptions::expire_in(0.0).expires_at(1_000_000), 1_000_000);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(PutValue::from("hi").into_stored().unwrap(), "hi");
        assert_eq!(
            PutValue::from(b"hi".as_slice()).into_stored().unwrap(),
            "aGk="
        );
        assert_eq!(
            PutValue::try_from(json!({"a": [1, 2]}))
                .unwrap()
                .into_stored()
                .unwrap(),
            r#"{"a":[1,2]}"#
        );
        assert_eq!(
            PutValue::try_from(json!(3.5)).unwrap().into_stored().unwrap(),
            "3.5"
        );
    }

    #[test]
    fn test_json_string_is_text() {
        assert_eq!(
            PutValue::try_from(json!("plain")).unwrap(),
            PutValue::Text("plain".into())
        );
    }

    #[test]
    fn test_unsupported() {
        let err = PutValue::try_from(json!(true)).unwrap_err();
        assert!(matches!(err, KvError::UnsupportedValueType("boolean")));
        assert!(PutValue::structured(&false).is_err());
    }

    #[test]
    fn test_structured_from_serialize() {
        #[derive(Serialize)]
        struct User {
            name: &'static str,
            age: u32,
        }

        let value = PutValue::structured(&User {
            name: "Alice",
            age: 30,
        })
        .unwrap();
        assert_eq!(
            value.into_stored().unwrap(),
            r#"{"name":"Alice","age":30}"#
        );
    }

    #[test]
    fn test_decode() {
        let json = KvValue::decode("[1,2]".into(), ValueType::Json).unwrap();
        assert!(matches!(json, KvValue::Json(v) if v == json!([1, 2])));

        let bytes = KvValue::decode("aGk=".into(), ValueType::ArrayBuffer).unwrap();
        assert!(matches!(bytes, KvValue::ArrayBuffer(b) if b == b"hi"));

        assert!(matches!(
            KvValue::decode("{oops".into(), ValueType::Json),
            Err(KvError::Json(_))
        ));
        assert!(matches!(
            KvValue::decode("***".into(), ValueType::ArrayBuffer),
            Err(KvError::Base64(_))
        ));
    }

    #[tokio::test]
    async fn test_stream_yields_single_chunk() {
        let value = KvValue::decode("aGk=".into(), ValueType::Stream).unwrap();
        let KvValue::Stream(stream) = value else {
            panic!("expected stream");
        };

        let chunks: Vec<Bytes> = stream.collect().await;
        assert_eq!(chunks, vec![Bytes::from_static(b"aGk=")]);
    }

    #[tokio::test]
    async fn test_into_json() {
        assert_eq!(KvValue::Text("a".into()).into_json().await, json!("a"));
        assert_eq!(KvValue::ArrayBuffer(vec![1, 2]).into_json().await, json!([1, 2]));
        assert_eq!(
            KvValue::Stream(TextStream::once("s".into())).into_json().await,
            json!("s")
        );
    }
}
