//! Gateway: HTTP webhook server and the per-event processing chain.
//!
//! The webhook handler returns as soon as each event of a batch has been handed to its own
//! task, so platform timeouts never depend on engine latency.

mod pipeline;
mod server;

pub use pipeline::{process_event, EventError, Services};
pub use server::{app, run_gateway, serve_until, ApiError, GatewayState, WEBHOOK_PATH};
