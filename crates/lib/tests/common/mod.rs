//! Fake collaborators that record calls, for gateway and pipeline tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ezsolver::answers::AnswerOptions;
use ezsolver::channels::{ChannelError, ChannelHandle, ReplyBatch, ReplyMessage};
use ezsolver::dispatch::Dispatcher;
use ezsolver::engine::{ComputeEngine, EngineError, Pod, Subpod};
use ezsolver::gateway::Services;
use ezsolver::normalize::Triggers;
use ezsolver::ocr::{OcrError, TextRecognizer};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub enum EngineReply {
    Pods(Vec<Pod>),
    Unavailable,
}

pub struct FakeEngine {
    pub queries: Mutex<Vec<String>>,
    reply: EngineReply,
    /// When set, queries block until notified.
    gate: Option<Arc<Notify>>,
}

impl FakeEngine {
    pub fn with_pods(pods: Vec<Pod>) -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            reply: EngineReply::Pods(pods),
            gate: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            reply: EngineReply::Unavailable,
            gate: None,
        }
    }

    pub fn gated(pods: Vec<Pod>, gate: Arc<Notify>) -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            reply: EngineReply::Pods(pods),
            gate: Some(gate),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComputeEngine for FakeEngine {
    async fn query(&self, input: &str) -> Result<Vec<Pod>, EngineError> {
        self.queries.lock().unwrap().push(input.to_string());
        if let Some(ref gate) = self.gate {
            gate.notified().await;
        }
        match &self.reply {
            EngineReply::Pods(pods) => Ok(pods.clone()),
            EngineReply::Unavailable => Err(EngineError::Upstream("503 busy".to_string())),
        }
    }
}

pub struct FakeRecognizer {
    pub text: Option<String>,
    pub images: Mutex<Vec<Vec<u8>>>,
}

impl FakeRecognizer {
    pub fn reading(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            images: Mutex::new(Vec::new()),
        }
    }

    pub fn blank() -> Self {
        Self {
            text: None,
            images: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextRecognizer for FakeRecognizer {
    async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        self.images.lock().unwrap().push(image.to_vec());
        self.text.clone().ok_or(OcrError::NoTextDetected)
    }
}

#[derive(Default)]
pub struct FakeChannel {
    pub replies: Mutex<Vec<(String, Vec<ReplyMessage>)>>,
    pub pushes: Mutex<Vec<ReplyBatch>>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeChannel {
    pub fn replies(&self) -> Vec<(String, Vec<ReplyMessage>)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<ReplyBatch> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelHandle for FakeChannel {
    fn id(&self) -> &str {
        "fake"
    }

    async fn reply(&self, reply_token: &str, messages: &[ReplyMessage]) -> Result<(), ChannelError> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), messages.to_vec()));
        Ok(())
    }

    async fn push(&self, batch: &ReplyBatch) -> Result<(), ChannelError> {
        self.pushes.lock().unwrap().push(batch.clone());
        Ok(())
    }

    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, ChannelError> {
        self.fetched.lock().unwrap().push(message_id.to_string());
        Ok(vec![0xff, 0xd8])
    }
}

pub struct Harness {
    pub engine: Arc<FakeEngine>,
    pub recognizer: Arc<FakeRecognizer>,
    pub channel: Arc<FakeChannel>,
    pub services: Arc<Services>,
}

impl Harness {
    pub fn new(engine: FakeEngine, recognizer: FakeRecognizer) -> Self {
        let engine = Arc::new(engine);
        let recognizer = Arc::new(recognizer);
        let channel = Arc::new(FakeChannel::default());
        let services = Arc::new(Services {
            engine: engine.clone(),
            recognizer: recognizer.clone(),
            dispatcher: Dispatcher::new(channel.clone()),
            triggers: Triggers::default(),
            answer_options: AnswerOptions {
                max_text_length: 60,
                image_proxy: Some("https://proxy.test".to_string()),
            },
        });
        Self {
            engine,
            recognizer,
            channel,
            services,
        }
    }
}

pub fn pod(title: &str, text: &str) -> Pod {
    Pod {
        title: title.to_string(),
        subpods: vec![Subpod {
            plain_text: text.to_string(),
            image_ref: Some(format!("https://img.test/{}.gif", title.replace(' ', "_"))),
        }],
    }
}

pub fn quadratic_pods() -> Vec<Pod> {
    vec![
        pod("Input", "x^2 + x - 1 = 0"),
        pod("Plot", ""),
        pod("Alternate forms", "(x + 1/2)^2 - 5/4 = 0"),
        pod("Solutions", "x = 1/2 (-1 - sqrt(5))\nx = 1/2 (sqrt(5) - 1)"),
    ]
}

/// Poll until `cond` holds or about two seconds pass.
pub async fn wait_for(cond: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    cond()
}
