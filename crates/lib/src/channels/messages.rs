//! Outbound reply shapes and their LINE wire form.

use serde_json::{json, Value};

use crate::answers::{AnswerCard, MAX_CARDS};

/// One outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMessage {
    Text(String),
    /// At most [`MAX_CARDS`] columns; build with [`ReplyMessage::carousel`].
    Carousel {
        columns: Vec<AnswerCard>,
        alt_text: String,
    },
}

impl ReplyMessage {
    pub fn text(text: impl Into<String>) -> Self {
        ReplyMessage::Text(text.into())
    }

    /// Carousel of cards; columns past the platform cap are dropped.
    pub fn carousel(mut columns: Vec<AnswerCard>, alt_text: impl Into<String>) -> Self {
        if columns.len() > MAX_CARDS {
            log::debug!(
                "carousel: dropping {} columns over the cap",
                columns.len() - MAX_CARDS
            );
            columns.truncate(MAX_CARDS);
        }
        ReplyMessage::Carousel {
            columns,
            alt_text: alt_text.into(),
        }
    }

    /// LINE Messaging API message object.
    pub fn to_wire(&self) -> Value {
        match self {
            ReplyMessage::Text(text) => json!({ "type": "text", "text": text }),
            ReplyMessage::Carousel { columns, alt_text } => {
                let columns: Vec<Value> = columns.iter().map(column_wire).collect();
                json!({
                    "type": "template",
                    "altText": alt_text,
                    "template": { "type": "carousel", "columns": columns }
                })
            }
        }
    }
}

fn column_wire(card: &AnswerCard) -> Value {
    let mut column = json!({
        "title": card.title,
        "text": card.text,
        "actions": [{
            "type": "message",
            "label": card.action_label,
            "text": card.action_text
        }]
    });
    if let Some(ref url) = card.thumbnail_url {
        column["thumbnailImageUrl"] = Value::String(url.clone());
    }
    column
}

/// Messages for one deferred delivery to a user, group, or room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyBatch {
    pub target_id: String,
    pub messages: Vec<ReplyMessage>,
}

impl ReplyBatch {
    pub fn to_wire(&self) -> Value {
        json!({
            "to": self.target_id,
            "messages": wire_messages(&self.messages),
        })
    }
}

pub(crate) fn wire_messages(messages: &[ReplyMessage]) -> Vec<Value> {
    messages.iter().map(ReplyMessage::to_wire).collect()
}
