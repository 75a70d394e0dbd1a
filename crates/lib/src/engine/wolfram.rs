//! Wolfram|Alpha v2 query API client (JSON output).

use async_trait::async_trait;
use serde::Deserialize;

use super::{ComputeEngine, Pod, Subpod};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("engine unavailable: {0}")]
    Upstream(String),
    #[error("malformed engine response: {0}")]
    Malformed(String),
    #[error("engine app id not configured")]
    NotConfigured,
}

impl EngineError {
    /// True for failures reaching the engine (as opposed to an unexpected response shape).
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            EngineError::Request(_) | EngineError::Upstream(_) | EngineError::NotConfigured
        )
    }
}

/// Client for the engine's query endpoint.
#[derive(Clone)]
pub struct WolframClient {
    base_url: String,
    app_id: Option<String>,
    client: reqwest::Client,
}

impl WolframClient {
    pub fn new(base_url: impl Into<String>, app_id: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            app_id,
            client: reqwest::Client::new(),
        }
    }

    /// GET {base_url}?input=..&appid=..&output=json. One attempt, no retry.
    pub async fn query_pods(&self, input: &str) -> Result<Vec<Pod>, EngineError> {
        let app_id = self.app_id.as_deref().ok_or(EngineError::NotConfigured)?;
        let res = self
            .client
            .get(&self.base_url)
            .query(&[("input", input), ("appid", app_id), ("output", "json")])
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(EngineError::Upstream(format!("{} {}", status, body)));
        }
        let body = res.text().await?;
        parse_query_response(&body)
    }
}

#[async_trait]
impl ComputeEngine for WolframClient {
    async fn query(&self, input: &str) -> Result<Vec<Pod>, EngineError> {
        self.query_pods(input).await
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    queryresult: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    success: bool,
    /// `false` on success; an object `{code, msg}` when the engine rejected the request.
    #[serde(default)]
    error: serde_json::Value,
    #[serde(default)]
    pods: Vec<RawPod>,
}

#[derive(Debug, Deserialize)]
struct RawPod {
    title: String,
    #[serde(default)]
    subpods: Vec<RawSubpod>,
}

#[derive(Debug, Deserialize)]
struct RawSubpod {
    #[serde(default)]
    plaintext: Option<String>,
    #[serde(default)]
    img: Option<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    src: String,
}

/// Parse a JSON query response into pods, preserving source order.
pub(crate) fn parse_query_response(body: &str) -> Result<Vec<Pod>, EngineError> {
    let data: QueryResponse =
        serde_json::from_str(body).map_err(|e| EngineError::Malformed(e.to_string()))?;
    let result = data.queryresult;
    if let Some(err) = result.error.as_object() {
        let msg = err
            .get("msg")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error");
        return Err(EngineError::Upstream(format!("engine error: {}", msg)));
    }
    if !result.success {
        log::debug!("engine returned no result");
    }
    let pods = result
        .pods
        .into_iter()
        .map(|p| Pod {
            title: p.title,
            subpods: p
                .subpods
                .into_iter()
                .map(|s| Subpod {
                    plain_text: s.plaintext.unwrap_or_default(),
                    image_ref: s.img.map(|i| i.src),
                })
                .collect(),
        })
        .collect();
    Ok(pods)
}
