//! Firestore REST store
//!
//! Appends go through `documents:commit` so the server can stamp the entry
//! with `REQUEST_TIME`; reads use a structured `runQuery` ordered by score.
//! Wire encoding is plain JSON and works on every target. The transport is
//! browser `fetch`, so [`FirestoreStore`] exists on wasm32 only.

use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::LeaderboardEntry;
use crate::error::StoreError;

/// Collection holding one document per submitted score
pub const COLLECTION: &str = "leaderboard";

const API_ROOT: &str = "https://firestore.googleapis.com/v1";
const DOC_ID_LEN: usize = 20;

/// Hosted store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirestoreConfig {
    pub project_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key,
        }
    }

    /// Resource path of the database's document root
    pub fn documents_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    pub fn commit_url(&self) -> String {
        self.endpoint("documents:commit")
    }

    pub fn run_query_url(&self) -> String {
        self.endpoint("documents:runQuery")
    }

    fn endpoint(&self, method: &str) -> String {
        let base = format!(
            "{}/projects/{}/databases/(default)/{}",
            API_ROOT, self.project_id, method
        );
        match &self.api_key {
            Some(key) => format!("{}?key={}", base, key),
            None => base,
        }
    }
}

/// Random client-side document id, same alphabet and length as the SDKs use
pub fn new_document_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(DOC_ID_LEN)
        .map(char::from)
        .collect()
}

/// Commit body creating one entry with a server-assigned timestamp
pub fn encode_append(config: &FirestoreConfig, doc_id: &str, name: &str, score: u64) -> Value {
    json!({
        "writes": [{
            "update": {
                "name": format!("{}/{}/{}", config.documents_path(), COLLECTION, doc_id),
                "fields": {
                    "name": { "stringValue": name },
                    "score": { "integerValue": score.to_string() },
                }
            },
            "currentDocument": { "exists": false },
            "updateTransforms": [{
                "fieldPath": "timestamp",
                "setToServerValue": "REQUEST_TIME",
            }]
        }]
    })
}

/// Structured query: whole collection ordered by score, highest first
pub fn encode_query(limit: Option<usize>) -> Value {
    let mut query = json!({
        "from": [{ "collectionId": COLLECTION }],
        "orderBy": [{
            "field": { "fieldPath": "score" },
            "direction": "DESCENDING",
        }],
    });
    if let Some(limit) = limit {
        query["limit"] = json!(limit);
    }
    json!({ "structuredQuery": query })
}

/// Decode a `runQuery` response.
///
/// Rows without a document (progress markers, empty results) are skipped.
/// `parse_time` turns an RFC 3339 timestamp into Unix ms.
pub fn decode_query(
    body: &str,
    parse_time: impl Fn(&str) -> Option<f64>,
) -> Result<Vec<LeaderboardEntry>, StoreError> {
    let rows: Vec<Value> = serde_json::from_str(body)?;
    let mut entries = Vec::with_capacity(rows.len());

    for row in &rows {
        let Some(fields) = row.get("document").map(|doc| &doc["fields"]) else {
            continue;
        };

        let name = fields["name"]["stringValue"]
            .as_str()
            .ok_or(StoreError::MissingField("name"))?
            .to_string();
        let score = decode_score(&fields["score"]).ok_or(StoreError::MissingField("score"))?;
        let submitted_at = fields["timestamp"]["timestampValue"]
            .as_str()
            .and_then(&parse_time);

        entries.push(LeaderboardEntry {
            name,
            score,
            submitted_at,
        });
    }

    Ok(entries)
}

fn decode_score(value: &Value) -> Option<u64> {
    if let Some(text) = value["integerValue"].as_str() {
        return text.parse().ok();
    }
    // Clients that wrote a JS number as a double
    value["doubleValue"]
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v as u64)
}

#[cfg(target_arch = "wasm32")]
mod transport {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use crate::error::StoreError;

    fn js_error(err: JsValue) -> StoreError {
        StoreError::Network(format!("{:?}", err))
    }

    /// POST a JSON body and return the response text
    pub async fn post_json(url: &str, body: &str) -> Result<String, StoreError> {
        let window = web_sys::window().ok_or_else(|| StoreError::Network("no window".to_string()))?;

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_mode(RequestMode::Cors);
        init.set_body(&JsValue::from_str(body));

        let request = Request::new_with_str_and_init(url, &init).map_err(js_error)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_error)?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_error)?
            .dyn_into()
            .map_err(js_error)?;

        if !response.ok() {
            return Err(StoreError::Status {
                status: response.status(),
            });
        }

        let text = JsFuture::from(response.text().map_err(js_error)?)
            .await
            .map_err(js_error)?;
        text.as_string()
            .ok_or_else(|| StoreError::Network("response body is not text".to_string()))
    }
}

/// Leaderboard store backed by the Firestore REST API
#[cfg(target_arch = "wasm32")]
pub struct FirestoreStore {
    config: FirestoreConfig,
}

#[cfg(target_arch = "wasm32")]
impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self { config }
    }
}

#[cfg(target_arch = "wasm32")]
impl super::LeaderboardStore for FirestoreStore {
    async fn append(&self, name: &str, score: u64) -> Result<(), StoreError> {
        let doc_id = new_document_id(&mut rand::rng());
        let body = encode_append(&self.config, &doc_id, name, score);
        transport::post_json(&self.config.commit_url(), &body.to_string()).await?;
        log::debug!("Appended leaderboard document {}", doc_id);
        Ok(())
    }

    async fn query_by_score(&self, limit: Option<usize>) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let body = encode_query(limit);
        let text = transport::post_json(&self.config.run_query_url(), &body.to_string()).await?;
        decode_query(&text, |s| {
            let ms = js_sys::Date::parse(s);
            (!ms.is_nan()).then_some(ms)
        })
    }
}
