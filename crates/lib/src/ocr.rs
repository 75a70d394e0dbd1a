//! OCR bridge: image bytes to a single-line query via a text-detection service
//! (Cloud Vision `images:annotate`, TEXT_DETECTION).

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("recognizer request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("recognizer unavailable: {0}")]
    Upstream(String),
    #[error("malformed recognizer response: {0}")]
    Malformed(String),
    #[error("no text detected in image")]
    NoTextDetected,
    #[error("vision api key not configured")]
    NotConfigured,
}

/// A service that recognizes the text in an image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Full recognized text (may span several lines).
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Replace every line break (`\r\n`, `\n`, `\r`) with "; " so a multi-line equation reads as one query.
pub fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", "; ")
        .replace('\n', "; ")
        .replace('\r', "; ")
}

/// Client for the Vision annotate endpoint.
#[derive(Clone)]
pub struct VisionClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl VisionClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// POST {base_url}?key=.. with one TEXT_DETECTION request; returns the first annotation's text.
    pub async fn detect_text(&self, image: &[u8]) -> Result<String, OcrError> {
        let key = self.api_key.as_deref().ok_or(OcrError::NotConfigured)?;
        let content = base64::engine::general_purpose::STANDARD.encode(image);
        let body = serde_json::json!({
            "requests": [{
                "image": { "content": content },
                "features": [{ "type": "TEXT_DETECTION", "maxResults": 1 }]
            }]
        });
        let res = self
            .client
            .post(&self.base_url)
            .query(&[("key", key)])
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(OcrError::Upstream(format!("{} {}", status, body)));
        }
        let body = res.text().await?;
        parse_annotate_response(&body)
    }
}

#[async_trait]
impl TextRecognizer for VisionClient {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        self.detect_text(image).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResponse {
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<TextAnnotation>,
    #[serde(default)]
    error: Option<StatusBody>,
}

#[derive(Debug, Deserialize)]
struct TextAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default)]
    message: String,
}

fn parse_annotate_response(body: &str) -> Result<String, OcrError> {
    let data: AnnotateResponse =
        serde_json::from_str(body).map_err(|e| OcrError::Malformed(e.to_string()))?;
    let first = data
        .responses
        .into_iter()
        .next()
        .ok_or_else(|| OcrError::Malformed("empty responses".to_string()))?;
    if let Some(err) = first.error {
        return Err(OcrError::Upstream(err.message));
    }
    first
        .text_annotations
        .into_iter()
        .next()
        .map(|a| a.description)
        .filter(|d| !d.trim().is_empty())
        .ok_or(OcrError::NoTextDetected)
}
