//! Inbound webhook events: LINE wire format and the platform-neutral [`IncomingEvent`].

use serde::Deserialize;

/// Top-level event kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Follow,
    Join,
    Message,
    /// Any other platform event (unfollow, postback, ...); logged and ignored.
    Other(String),
}

/// Kind of conversation the event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationKind {
    Individual,
    Group,
    Room,
}

impl ConversationKind {
    /// Group and room conversations have several members; the bot must be addressed there.
    pub fn is_group_like(self) -> bool {
        matches!(self, ConversationKind::Group | ConversationKind::Room)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    pub kind: ConversationKind,
    /// Push target: user id, group id, or room id depending on `kind`.
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    pub kind: MessageKind,
    pub id: String,
    /// Text content; empty for non-text messages.
    pub text: String,
}

/// One inbound event from a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingEvent {
    pub kind: EventKind,
    /// Single-use token for the immediate reply; absent for some event kinds.
    pub reply_token: Option<String>,
    pub source: EventSource,
    pub message: Option<EventMessage>,
}

/// Webhook POST body: `{ "destination", "events": [...] }`.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<LineEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineEvent {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<LineSource>,
    #[serde(default)]
    pub message: Option<LineMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSource {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LineMessage {
    #[serde(rename = "type")]
    pub typ: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl LineSource {
    fn to_source(&self) -> Option<EventSource> {
        let (kind, id) = match self.typ.as_str() {
            "user" => (ConversationKind::Individual, self.user_id.as_ref()),
            "group" => (ConversationKind::Group, self.group_id.as_ref()),
            "room" => (ConversationKind::Room, self.room_id.as_ref()),
            _ => return None,
        };
        Some(EventSource {
            kind,
            id: id?.clone(),
        })
    }
}

impl LineMessage {
    fn to_message(&self) -> EventMessage {
        let kind = match self.typ.as_str() {
            "text" => MessageKind::Text,
            "image" => MessageKind::Image,
            other => MessageKind::Other(other.to_string()),
        };
        EventMessage {
            kind,
            id: self.id.clone(),
            text: self.text.clone().unwrap_or_default(),
        }
    }
}

impl LineEvent {
    /// Convert to an [`IncomingEvent`]. Returns None when the source is missing or unknown,
    /// since such an event has nobody to answer.
    pub fn to_incoming(&self) -> Option<IncomingEvent> {
        let source = self.source.as_ref()?.to_source()?;
        let kind = match self.typ.as_str() {
            "follow" => EventKind::Follow,
            "join" => EventKind::Join,
            "message" => EventKind::Message,
            other => EventKind::Other(other.to_string()),
        };
        Some(IncomingEvent {
            kind,
            reply_token: self.reply_token.clone(),
            source,
            message: self.message.as_ref().map(LineMessage::to_message),
        })
    }
}
