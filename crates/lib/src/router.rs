//! Event router: decides, per inbound event, whether and how the bot answers.
//!
//! Routing is a pure function of the event and the trigger settings; the gateway executes
//! the returned [`Route`]. Nothing is remembered between events.

use crate::channels::{ConversationKind, EventKind, IncomingEvent, MessageKind};
use crate::normalize::{self, Triggers};
use crate::replies;

/// Conversational voice for replies: group chats need the trigger word, direct chats do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationContext {
    Direct,
    Group,
}

impl ConversationContext {
    pub fn of(kind: ConversationKind) -> Self {
        if kind.is_group_like() {
            ConversationContext::Group
        } else {
            ConversationContext::Direct
        }
    }

    pub fn needs_trigger(self) -> bool {
        self == ConversationContext::Group
    }
}

/// Why an event gets no reply at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Group chatter that does not mention the bot.
    NotAddressed,
    /// Event kind the bot does not handle (unfollow, postback, ...).
    UnknownEvent(String),
}

/// What to do with one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Answer once with this text and stop.
    Reply(String),
    /// Send nothing.
    Ignore(IgnoreReason),
    /// Acknowledge, then answer the query through the engine.
    SolveText { query: String },
    /// Acknowledge, then recognize the image, then answer through the engine.
    SolveImage { message_id: String },
    /// Acknowledge, then say the message type is not supported.
    Unsupported { message_kind: String },
}

impl Route {
    /// True when the route starts with the "looking for the answer" acknowledgment.
    pub fn acknowledges(&self) -> bool {
        matches!(
            self,
            Route::SolveText { .. } | Route::SolveImage { .. } | Route::Unsupported { .. }
        )
    }
}

/// Route one event.
pub fn route(event: &IncomingEvent, triggers: &Triggers) -> Route {
    let context = ConversationContext::of(event.source.kind);
    match &event.kind {
        EventKind::Follow => Route::Reply(replies::welcome(context, triggers)),
        EventKind::Join => Route::Reply(replies::join_invitation(triggers)),
        EventKind::Other(kind) => Route::Ignore(IgnoreReason::UnknownEvent(kind.clone())),
        EventKind::Message => route_message(event, context, triggers),
    }
}

fn route_message(event: &IncomingEvent, context: ConversationContext, triggers: &Triggers) -> Route {
    let raw_text = event.message.as_ref().map(|m| m.text.as_str()).unwrap_or("");
    if context.needs_trigger() && !normalize::is_addressed(raw_text, triggers) {
        return Route::Ignore(IgnoreReason::NotAddressed);
    }
    let query = normalize::normalize(raw_text, triggers);
    if normalize::is_help_command(&query) {
        return Route::Reply(replies::help(context, triggers));
    }
    let Some(message) = event.message.as_ref() else {
        return Route::Unsupported {
            message_kind: "none".to_string(),
        };
    };
    match &message.kind {
        MessageKind::Text => Route::SolveText { query },
        MessageKind::Image => Route::SolveImage {
            message_id: message.id.clone(),
        },
        MessageKind::Other(kind) => Route::Unsupported {
            message_kind: kind.clone(),
        },
    }
}
