//! Chat platform plumbing (LINE).
//!
//! Inbound webhook events are converted into [`IncomingEvent`]s for the router; replies go
//! out through a [`ChannelHandle`] so the gateway can run against a fake in tests.

mod events;
mod handle;
mod line;
mod messages;

pub use events::{
    ConversationKind, EventKind, EventMessage, EventSource, IncomingEvent, LineEvent,
    MessageKind, WebhookBody,
};
pub use handle::{ChannelError, ChannelHandle};
pub use line::{sign_body, verify_signature, LineChannel, SIGNATURE_HEADER};
pub use messages::{ReplyBatch, ReplyMessage};
