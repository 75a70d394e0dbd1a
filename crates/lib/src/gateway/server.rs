//! Gateway HTTP server: LINE webhook endpoint and health probe.

use crate::channels::{self, IncomingEvent, WebhookBody, SIGNATURE_HEADER};
use crate::config::{self, Config};
use crate::gateway::pipeline::{process_event, Services};
use anyhow::{Context, Result};
use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;

/// Path the platform POSTs webhook batches to.
pub const WEBHOOK_PATH: &str = "/v1/lineWebhook";

/// Shared state for request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Port reported by the health probe.
    pub port: u16,
    /// When Some, webhook bodies must carry a matching X-Line-Signature.
    pub channel_secret: Option<String>,
    pub services: Arc<Services>,
}

/// Error bodies: `{ status, code, message }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Forbidden(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };
        let body = json!({
            "status": label,
            "code": status.as_u16().to_string(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

/// 500 body for failures escaping a handler.
fn internal_error_response(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    log::error!("uncaught error while handling request: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "status": "Error", "code": "500" })),
    )
        .into_response()
}

/// Log method, path, and header names of every request (values may hold credentials).
async fn log_request(req: Request, next: Next) -> Response {
    let header_names: Vec<&str> = req.headers().keys().map(|k| k.as_str()).collect();
    log::info!(
        "{} {} with headers {:?}",
        req.method(),
        req.uri().path(),
        header_names
    );
    next.run(req).await
}

/// Build the router with logging and panic handling.
pub fn app(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route(WEBHOOK_PATH, post(line_webhook))
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(CatchPanicLayer::custom(internal_error_response))
}

/// Serve on an already bound listener until `shutdown` completes.
pub async fn serve_until<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("gateway server exited")
}

/// Run the gateway with real upstream clients; binds to config.gateway.bind and `port`, falling
/// back to PORT env and then config. Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config, port: Option<u16>) -> Result<()> {
    let services = Arc::new(Services::from_config(&config));
    if config::resolve_line_token(&config).is_none() {
        log::warn!("LINE channel token not configured; replies will fail");
    }
    if config::resolve_engine_app_id(&config).is_none() {
        log::warn!("engine app id not configured; queries will fail");
    }
    let port = port.unwrap_or_else(|| config::resolve_port(&config));
    let state = GatewayState {
        port,
        channel_secret: config::resolve_line_secret(&config),
        services,
    };
    if state.channel_secret.is_none() {
        log::warn!("LINE channel secret not configured; webhook signatures are not verified");
    }

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("EZSolver started on {}", bind_addr);

    serve_until(listener, state, shutdown_signal()).await?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /v1/lineWebhook: verifies the optional signature, spawns one task per event, answers "Ok" at once.
async fn line_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<&'static str>, ApiError> {
    if let Some(ref secret) = state.channel_secret {
        let provided = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !channels::verify_signature(secret, &body, provided) {
            log::warn!("webhook signature mismatch, rejecting");
            return Err(ApiError::Forbidden("Invalid signature".to_string()));
        }
    }
    let webhook: WebhookBody = serde_json::from_slice(&body).map_err(|e| {
        log::warn!("webhook body rejected: {}", e);
        ApiError::BadRequest("Invalid JSON".to_string())
    })?;
    log::debug!(
        "webhook batch of {} event(s) for {:?}",
        webhook.events.len(),
        webhook.destination
    );
    for raw in &webhook.events {
        let Some(event) = raw.to_incoming() else {
            log::warn!("skipping {:?} event without a usable source", raw.typ);
            continue;
        };
        spawn_event(&state, event);
    }
    Ok(Json("Ok"))
}

fn spawn_event(state: &GatewayState, event: IncomingEvent) {
    let services = state.services.clone();
    tokio::spawn(process_event(services, event));
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.port,
    }))
}
