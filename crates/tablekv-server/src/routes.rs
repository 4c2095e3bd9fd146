//! Request dispatch
//!
//! Every request gets a fresh [`KvAdapter`] over the shared database handle.
//! The adapter's table is created if needed before the path is looked at.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tablekv::{GetOptions, KvAdapter, KvError, PutOptions};
use tablekv_sql::SharedAdapter;
use thiserror::Error;

/// State shared by all requests
pub struct AppState {
    db: SharedAdapter,
    table: String,
}

impl AppState {
    pub fn new(db: SharedAdapter, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }

    fn adapter(&self) -> Result<KvAdapter, KvError> {
        KvAdapter::with_table(self.db.clone(), &self.table)
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("missing query parameter: {0}")]
    MissingParameter(&'static str),

    #[error(transparent)]
    Kv(#[from] KvError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Get,
    Put,
    Delete,
}

impl Route {
    fn from_path(path: &str) -> Option<Self> {
        match path {
            "/kv" => Some(Route::Get),
            "/kv/put" => Some(Route::Put),
            "/kv/delete" => Some(Route::Delete),
            _ => None,
        }
    }
}

/// Decoded query string; the first occurrence of a name wins
struct QueryParams(HashMap<String, String>);

impl QueryParams {
    fn parse(query: Option<&str>) -> Self {
        let mut params = HashMap::new();
        if let Some(query) = query {
            for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params
                    .entry(name.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        Self(params)
    }

    fn require(&self, name: &'static str) -> Result<&str, RequestError> {
        self.0
            .get(name)
            .map(String::as_str)
            .ok_or(RequestError::MissingParameter(name))
    }
}

/// Handle one request. The method and body are ignored.
pub async fn handle<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>> {
    let (parts, _) = req.into_parts();
    let path = parts.uri.path().to_string();
    let params = QueryParams::parse(parts.uri.query());

    tracing::debug!(method = %parts.method, path = %path, "request");

    match respond(state, &path, &params).await {
        Ok(Some(body)) => json_response(&body),
        Ok(None) => text_response(StatusCode::NOT_FOUND, "Not found"),
        Err(e) => {
            tracing::error!(path = %path, error = %e, "request failed");
            text_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn respond(
    state: &AppState,
    path: &str,
    params: &QueryParams,
) -> Result<Option<JsonValue>, RequestError> {
    let kv = state.adapter()?;
    kv.initialize().await?;

    let Some(route) = Route::from_path(path) else {
        return Ok(None);
    };

    let body = match route {
        Route::Get => {
            let key = params.require("key")?;
            match kv.get(key, GetOptions::default()).await? {
                Some(value) => value.into_json().await,
                None => JsonValue::Null,
            }
        }
        Route::Put => {
            let key = params.require("key")?;
            let value = params.require("value")?;
            serde_json::to_value(kv.put(key, value, PutOptions::default()).await?)?
        }
        Route::Delete => {
            let key = params.require("key")?;
            serde_json::to_value(kv.delete(key).await?)?
        }
    };

    Ok(Some(body))
}

fn json_response(body: &JsonValue) -> Response<Full<Bytes>> {
    // Serializing a Value cannot fail
    let bytes = serde_json::to_vec(body).unwrap_or_default();
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn text_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
