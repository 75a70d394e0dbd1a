//! Per-event processing chain: route, acknowledge, (recognize), query, rank, deliver.
//!
//! Each event runs in its own task with no shared mutable state. Any failure ends that
//! event's chain with a log line; the gateway keeps serving.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::answers::{self, AnswerOptions};
use crate::channels::{ChannelError, IncomingEvent, LineChannel, ReplyBatch, ReplyMessage};
use crate::config::{self, Config};
use crate::dispatch::Dispatcher;
use crate::engine::{ComputeEngine, EngineError, WolframClient};
use crate::normalize::{self, Triggers};
use crate::ocr::{self, OcrError, TextRecognizer, VisionClient};
use crate::replies;
use crate::router::{self, ConversationContext, IgnoreReason, Route};

/// Why an event's chain stopped before its final reply.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("content download failed: {0}")]
    Content(#[from] ChannelError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

/// Collaborators and settings shared (read-only) by every event task.
pub struct Services {
    pub engine: Arc<dyn ComputeEngine>,
    pub recognizer: Arc<dyn TextRecognizer>,
    pub dispatcher: Dispatcher,
    pub triggers: Triggers,
    pub answer_options: AnswerOptions,
}

impl Services {
    /// Real HTTP clients from config (credentials resolved from env first).
    pub fn from_config(config: &Config) -> Self {
        let engine = WolframClient::new(
            config.engine.base_url.clone(),
            config::resolve_engine_app_id(config),
        );
        let recognizer = VisionClient::new(
            config.vision.base_url.clone(),
            config::resolve_vision_key(config),
        );
        let line = LineChannel::from_config(config);
        Self {
            engine: Arc::new(engine),
            recognizer: Arc::new(recognizer),
            dispatcher: Dispatcher::new(Arc::new(line)),
            triggers: Triggers::from_config(&config.answers),
            answer_options: AnswerOptions {
                max_text_length: config.answers.max_text_length,
                image_proxy: config::resolve_image_proxy_url(config),
            },
        }
    }
}

/// Process one event to completion. Never fails; problems are logged.
pub async fn process_event(services: Arc<Services>, event: IncomingEvent) {
    log::info!(
        "event {:?} from {:?} conversation",
        event.kind,
        event.source.kind
    );
    let route = router::route(&event, &services.triggers);
    let token = event.reply_token.as_deref();
    if route.acknowledges() {
        services.dispatcher.acknowledge(token, replies::ACKNOWLEDGMENT);
    }
    match route {
        Route::Ignore(IgnoreReason::NotAddressed) => {
            log::debug!("group message does not mention the bot, ignoring");
        }
        Route::Ignore(IgnoreReason::UnknownEvent(kind)) => {
            log::info!("unhandled event type {:?}, ignoring", kind);
        }
        Route::Reply(text) => {
            services
                .dispatcher
                .reply(token, vec![ReplyMessage::text(text)]);
        }
        Route::SolveText { query } => {
            if let Err(e) = answer(&services, &event, &query).await {
                log_failure("text query", &e);
            }
        }
        Route::SolveImage { message_id } => {
            let result = async {
                let query = recognize_image(&services, &message_id).await?;
                answer(&services, &event, &query).await
            }
            .await;
            if let Err(e) = result {
                log_failure("image query", &e);
            }
        }
        Route::Unsupported { message_kind } => {
            log::warn!("unsupported message type {:?}", message_kind);
            let batch = ReplyBatch {
                target_id: event.source.id.clone(),
                messages: vec![ReplyMessage::text(replies::UNSUPPORTED_TYPE)],
            };
            deliver(services.dispatcher.deliver(batch)).await;
        }
    }
}

/// Malformed engine responses log at error level, other failures at warn.
fn failure_level(err: &EventError) -> log::Level {
    match err {
        EventError::Engine(e) if !e.is_unavailable() => log::Level::Error,
        _ => log::Level::Warn,
    }
}

fn log_failure(what: &str, err: &EventError) {
    log::log!(failure_level(err), "{} failed: {}", what, err);
}

async fn deliver(task: JoinHandle<()>) {
    if let Err(e) = task.await {
        log::error!("delivery task failed: {}", e);
    }
}

/// Download the image, recognize it, and turn the text into a one-line query.
async fn recognize_image(services: &Services, message_id: &str) -> Result<String, EventError> {
    let image = services
        .dispatcher
        .channel()
        .fetch_content(message_id)
        .await?;
    log::debug!("downloaded image {} ({} bytes)", message_id, image.len());
    let text = services.recognizer.recognize(&image).await?;
    let query = normalize::normalize(&ocr::flatten_lines(&text), &services.triggers);
    log::info!("recognized query {:?}", query);
    Ok(query)
}

/// Query the engine, rank the pods, and push the answer to the conversation.
async fn answer(services: &Services, event: &IncomingEvent, query: &str) -> Result<(), EventError> {
    let pods = services.engine.query(query).await?;
    log::debug!("engine returned {} pods for {:?}", pods.len(), query);
    let selection = answers::select(&pods, &services.answer_options);
    let context = ConversationContext::of(event.source.kind);
    let batch = ReplyBatch {
        target_id: event.source.id.clone(),
        messages: replies::answer_messages(selection, context, &services.triggers),
    };
    deliver(services.dispatcher.deliver(batch)).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_engine_response_logs_as_error() {
        let err = EventError::Engine(EngineError::Malformed("no queryresult".into()));
        assert_eq!(failure_level(&err), log::Level::Error);
    }

    #[test]
    fn unreachable_upstreams_log_as_warning() {
        for err in [
            EventError::Engine(EngineError::Upstream("down".into())),
            EventError::Engine(EngineError::NotConfigured),
            EventError::Ocr(OcrError::NoTextDetected),
            EventError::Content(ChannelError::NotConfigured),
        ] {
            assert_eq!(failure_level(&err), log::Level::Warn, "{}", err);
        }
    }

    #[tokio::test]
    async fn panicking_delivery_task_is_contained() {
        deliver(tokio::spawn(async { panic!("push exploded") })).await;
    }
}
