//! Firestore REST client
//!
//! Reads go through `GET documents/{path}`. Writes go through
//! `documents:commit` so that `FieldValue::ServerTimestamp` fields can be
//! sent as `REQUEST_TIME` transforms in the same write.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

use super::{read_failure, store_error, TokenSource};
use crate::config::FirebaseConfig;
use crate::platform::{DocPath, DocumentStore, FieldValue, Fields, PlatformResult};

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Create or replace the whole document
    Replace,
    /// Merge the given fields; the document must exist
    Merge,
}

/// Document store backed by the Firestore REST API
pub struct FirestoreStore {
    client: Client,
    config: FirebaseConfig,
    tokens: Rc<dyn TokenSource>,
}

impl FirestoreStore {
    pub fn new(config: FirebaseConfig, tokens: Rc<dyn TokenSource>) -> Self {
        Self {
            client: Client::new(),
            config,
            tokens,
        }
    }

    /// `projects/{project}/databases/(default)/documents`
    fn documents_root(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.config.project_id)
    }

    fn document_name(&self, path: &DocPath) -> String {
        format!(
            "{}/{}/{}",
            self.documents_root(),
            path.collection(),
            urlencoding::encode(path.id())
        )
    }

    fn api_url(&self, resource: &str) -> String {
        format!("{}/{}", self.config.firestore_url.trim_end_matches('/'), resource)
    }

    async fn authorized(&self, request: reqwest::RequestBuilder) -> PlatformResult<reqwest::RequestBuilder> {
        Ok(match self.tokens.id_token().await? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn commit(&self, path: &DocPath, fields: Fields, mode: WriteMode) -> PlatformResult<()> {
        let body = commit_body(&self.document_name(path), &fields, mode);
        let url = self.api_url(&format!("{}:commit", self.documents_root()));

        let response = self
            .authorized(self.client.post(url).json(&body))
            .await?
            .send()
            .await?;

        if !response.status().is_success() {
            let err = read_failure(response, store_error).await;
            warn!(path = %path, "Commit failed: {}", err);
            return Err(err);
        }

        debug!(path = %path, ?mode, "Committed write");
        Ok(())
    }
}

#[async_trait(?Send)]
impl DocumentStore for FirestoreStore {
    async fn get(&self, path: &DocPath) -> PlatformResult<Option<Fields>> {
        let url = self.api_url(&self.document_name(path));
        let response = self.authorized(self.client.get(url)).await?.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(read_failure(response, store_error).await);
        }

        let document: Document = response.json().await?;
        Ok(Some(decode_fields(&document.fields)))
    }

    async fn set(&self, path: &DocPath, fields: Fields) -> PlatformResult<()> {
        self.commit(path, fields, WriteMode::Replace).await
    }

    async fn update(&self, path: &DocPath, fields: Fields) -> PlatformResult<()> {
        self.commit(path, fields, WriteMode::Merge).await
    }
}

/// Build the `documents:commit` request for a single document write
fn commit_body(name: &str, fields: &Fields, mode: WriteMode) -> Value {
    let mut encoded = Map::new();
    let mut transforms = Vec::new();

    for (key, value) in fields {
        match encode_value(value) {
            Some(v) => {
                encoded.insert(key.clone(), v);
            }
            None => transforms.push(json!({
                "fieldPath": key,
                "setToServerValue": "REQUEST_TIME",
            })),
        }
    }

    let mut write = Map::new();
    write.insert(
        "update".to_string(),
        json!({ "name": name, "fields": Value::Object(encoded.clone()) }),
    );

    if mode == WriteMode::Merge {
        let paths: Vec<&String> = encoded.keys().collect();
        write.insert("updateMask".to_string(), json!({ "fieldPaths": paths }));
        write.insert("currentDocument".to_string(), json!({ "exists": true }));
    }
    if !transforms.is_empty() {
        write.insert("updateTransforms".to_string(), Value::Array(transforms));
    }

    json!({ "writes": [Value::Object(write)] })
}

/// Wire form of a field; `None` for the server timestamp sentinel
fn encode_value(value: &FieldValue) -> Option<Value> {
    Some(match value {
        FieldValue::Null => json!({ "nullValue": null }),
        FieldValue::Bool(b) => json!({ "booleanValue": b }),
        FieldValue::Integer(i) => json!({ "integerValue": i.to_string() }),
        FieldValue::Double(d) => json!({ "doubleValue": d }),
        FieldValue::String(s) => json!({ "stringValue": s }),
        FieldValue::Timestamp(ts) => {
            json!({ "timestampValue": ts.to_rfc3339_opts(SecondsFormat::Micros, true) })
        }
        FieldValue::ServerTimestamp => return None,
    })
}

fn decode_value(value: &Value) -> Option<FieldValue> {
    let (kind, inner) = value.as_object()?.iter().next()?;
    match kind.as_str() {
        "nullValue" => Some(FieldValue::Null),
        "booleanValue" => inner.as_bool().map(FieldValue::Bool),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse().ok())
            .or_else(|| inner.as_i64())
            .map(FieldValue::Integer),
        "doubleValue" => inner.as_f64().map(FieldValue::Double),
        "stringValue" => inner.as_str().map(|s| FieldValue::String(s.to_string())),
        "timestampValue" => inner
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| FieldValue::Timestamp(ts.with_timezone(&Utc))),
        _ => None,
    }
}

/// Fields of kinds the client does not use (maps, arrays, references) are dropped
fn decode_fields(fields: &HashMap<String, Value>) -> Fields {
    fields
        .iter()
        .filter_map(|(key, value)| decode_value(value).map(|v| (key.clone(), v)))
        .collect()
}
