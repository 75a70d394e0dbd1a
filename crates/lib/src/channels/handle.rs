//! Channel handle: the operations the gateway needs from a chat platform.

use async_trait::async_trait;

use super::messages::{ReplyBatch, ReplyMessage};

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("channel rejected request: {status} {body}")]
    Rejected { status: u16, body: String },
    #[error("channel access token not configured")]
    NotConfigured,
}

/// Handle to a chat platform connection (reply, push, content download).
#[async_trait]
pub trait ChannelHandle: Send + Sync {
    /// Channel id (e.g. "line").
    fn id(&self) -> &str;

    /// Answer with a single-use reply token (immediate acknowledgment).
    async fn reply(&self, reply_token: &str, messages: &[ReplyMessage]) -> Result<(), ChannelError>;

    /// Deliver messages to a user, group, or room by id (deferred answer).
    async fn push(&self, batch: &ReplyBatch) -> Result<(), ChannelError>;

    /// Download the binary content of a message (e.g. an image).
    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, ChannelError>;
}
