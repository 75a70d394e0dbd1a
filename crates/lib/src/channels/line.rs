//! LINE channel: Messaging API reply/push, message content download, and webhook signature check.

use async_trait::async_trait;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::handle::{ChannelError, ChannelHandle};
use super::messages::{wire_messages, ReplyBatch, ReplyMessage};
use crate::config::{self, Config};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 of the webhook body.
pub const SIGNATURE_HEADER: &str = "X-Line-Signature";

/// LINE Messaging API connector.
pub struct LineChannel {
    id: String,
    token: Option<String>,
    api_base: String,
    data_api_base: String,
    client: reqwest::Client,
}

impl LineChannel {
    pub fn new(
        token: Option<String>,
        api_base: impl Into<String>,
        data_api_base: impl Into<String>,
    ) -> Self {
        Self {
            id: "line".to_string(),
            token,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            data_api_base: data_api_base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config::resolve_line_token(config),
            config.line.api_base.clone(),
            config.line.data_api_base.clone(),
        )
    }

    fn token(&self) -> Result<&str, ChannelError> {
        self.token.as_deref().ok_or(ChannelError::NotConfigured)
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<(), ChannelError> {
        let res = self
            .client
            .post(url)
            .bearer_auth(self.token()?)
            .json(body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected { status, body });
        }
        Ok(())
    }

    /// POST /v2/bot/message/reply.
    pub async fn reply_message(
        &self,
        reply_token: &str,
        messages: &[ReplyMessage],
    ) -> Result<(), ChannelError> {
        let url = format!("{}/v2/bot/message/reply", self.api_base);
        let body = serde_json::json!({
            "replyToken": reply_token,
            "messages": wire_messages(messages),
        });
        self.post_json(&url, &body).await
    }

    /// POST /v2/bot/message/push.
    pub async fn push_message(&self, batch: &ReplyBatch) -> Result<(), ChannelError> {
        let url = format!("{}/v2/bot/message/push", self.api_base);
        self.post_json(&url, &batch.to_wire()).await
    }

    /// GET /v2/bot/message/{id}/content on the data API.
    pub async fn message_content(&self, message_id: &str) -> Result<Vec<u8>, ChannelError> {
        let url = format!(
            "{}/v2/bot/message/{}/content",
            self.data_api_base,
            urlencoding::encode(message_id)
        );
        let res = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected { status, body });
        }
        Ok(res.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ChannelHandle for LineChannel {
    fn id(&self) -> &str {
        &self.id
    }

    async fn reply(&self, reply_token: &str, messages: &[ReplyMessage]) -> Result<(), ChannelError> {
        self.reply_message(reply_token, messages).await
    }

    async fn push(&self, batch: &ReplyBatch) -> Result<(), ChannelError> {
        self.push_message(batch).await
    }

    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, ChannelError> {
        self.message_content(message_id).await
    }
}

/// Verify `X-Line-Signature`: base64 of HMAC-SHA256 over the raw body, keyed by the channel secret.
pub fn verify_signature(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(signature.trim()) else {
        log::warn!("webhook signature is not valid base64");
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(channel_secret.as_bytes()) else {
        log::warn!("failed to create HMAC");
        return false;
    };
    mac.update(body);
    // verify_slice compares in constant time.
    mac.verify_slice(&expected).is_ok()
}

/// Signature value the platform would send for `body`.
pub fn sign_body(channel_secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes()).ok()?;
    mac.update(body);
    Some(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
