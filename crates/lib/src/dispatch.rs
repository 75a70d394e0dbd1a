//! Reply dispatcher: fire-and-forget sends over a channel handle.
//!
//! Both operations spawn the send and return immediately. Failures are logged and dropped;
//! nothing is retried and the user only notices a missing reply.

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::channels::{ChannelHandle, ReplyBatch, ReplyMessage};

#[derive(Clone)]
pub struct Dispatcher {
    channel: Arc<dyn ChannelHandle>,
}

impl Dispatcher {
    pub fn new(channel: Arc<dyn ChannelHandle>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &Arc<dyn ChannelHandle> {
        &self.channel
    }

    /// Immediate text reply using the event's reply token.
    pub fn acknowledge(&self, reply_token: Option<&str>, text: &str) -> Option<JoinHandle<()>> {
        self.reply(reply_token, vec![ReplyMessage::text(text)])
    }

    /// Immediate reply with arbitrary messages. Returns None (and sends nothing) without a token.
    pub fn reply(
        &self,
        reply_token: Option<&str>,
        messages: Vec<ReplyMessage>,
    ) -> Option<JoinHandle<()>> {
        let Some(token) = reply_token else {
            log::debug!("{}: event has no reply token, skipping reply", self.channel.id());
            return None;
        };
        let channel = self.channel.clone();
        let token = token.to_string();
        Some(tokio::spawn(async move {
            match channel.reply(&token, &messages).await {
                Ok(()) => log::info!("{}: reply sent", channel.id()),
                Err(e) => log::warn!("{}: reply failed: {}", channel.id(), e),
            }
        }))
    }

    /// Deferred delivery to the conversation's target id.
    pub fn deliver(&self, batch: ReplyBatch) -> JoinHandle<()> {
        let channel = self.channel.clone();
        tokio::spawn(async move {
            match channel.push(&batch).await {
                Ok(()) => log::info!(
                    "{}: delivered {} message(s)",
                    channel.id(),
                    batch.messages.len()
                ),
                Err(e) => log::error!("{}: delivery failed: {}", channel.id(), e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        replies: Mutex<Vec<(String, Vec<ReplyMessage>)>>,
        pushes: Mutex<Vec<ReplyBatch>>,
        fail: bool,
    }

    #[async_trait]
    impl ChannelHandle for Recorder {
        fn id(&self) -> &str {
            "test"
        }

        async fn reply(&self, reply_token: &str, messages: &[ReplyMessage]) -> Result<(), ChannelError> {
            self.replies
                .lock()
                .unwrap()
                .push((reply_token.to_string(), messages.to_vec()));
            if self.fail {
                return Err(ChannelError::Rejected {
                    status: 400,
                    body: "bad token".into(),
                });
            }
            Ok(())
        }

        async fn push(&self, batch: &ReplyBatch) -> Result<(), ChannelError> {
            self.pushes.lock().unwrap().push(batch.clone());
            if self.fail {
                return Err(ChannelError::NotConfigured);
            }
            Ok(())
        }

        async fn fetch_content(&self, _message_id: &str) -> Result<Vec<u8>, ChannelError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn acknowledge_replies_with_token() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(recorder.clone());
        dispatcher
            .acknowledge(Some("rt"), "wait")
            .unwrap()
            .await
            .unwrap();
        let replies = recorder.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "rt");
        assert_eq!(replies[0].1, vec![ReplyMessage::text("wait")]);
    }

    #[tokio::test]
    async fn acknowledge_without_token_sends_nothing() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(recorder.clone());
        assert!(dispatcher.acknowledge(None, "wait").is_none());
        assert!(recorder.replies.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn deliver_pushes_batch() {
        let recorder = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(recorder.clone());
        let batch = ReplyBatch {
            target_id: "U1".into(),
            messages: vec![ReplyMessage::text("42")],
        };
        dispatcher.deliver(batch.clone()).await.unwrap();
        assert_eq!(*recorder.pushes.lock().unwrap(), vec![batch]);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(recorder.clone());
        dispatcher.acknowledge(Some("rt"), "x").unwrap().await.unwrap();
        dispatcher
            .deliver(ReplyBatch {
                target_id: "U1".into(),
                messages: vec![],
            })
            .await
            .unwrap();
        assert_eq!(recorder.replies.lock().unwrap().len(), 1);
        assert_eq!(recorder.pushes.lock().unwrap().len(), 1);
    }
}
