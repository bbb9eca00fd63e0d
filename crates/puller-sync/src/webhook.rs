//! Inbound push-notification gateway.
//!
//! Authenticates GitHub webhook deliveries and dispatches qualifying push
//! events to the updater. Every decision branch is written to the activity
//! log before the HTTP response goes out.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use puller_core::activity::{LogSource, LogStatus, Meta};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{SyncError, Updater};

const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const EVENT_HEADER: &str = "x-github-event";
const DELIVERY_HEADER: &str = "x-github-delivery";

#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref", default)]
    git_ref: String,
    #[serde(default)]
    after: String,
    #[serde(default)]
    head_commit: Option<HeadCommit>,
}

#[derive(Debug, Deserialize)]
struct HeadCommit {
    #[serde(default)]
    message: String,
}

pub fn router(updater: Arc<Updater>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(updater)
}

pub async fn serve(updater: Arc<Updater>, addr: SocketAddr) -> Result<(), SyncError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook gateway listening");
    axum::serve(listener, router(updater)).await?;
    Ok(())
}

async fn handle_webhook(
    State(updater): State<Arc<Updater>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = header_str(&headers, EVENT_HEADER);
    let delivery = header_str(&headers, DELIVERY_HEADER);

    log_info(
        &updater,
        &format!(
            "Webhook received: {} (delivery: {})",
            event.as_deref().unwrap_or("unknown"),
            delivery.as_deref().unwrap_or("unknown")
        ),
    );

    if event.as_deref() == Some("ping") {
        return respond(StatusCode::OK, true, "Pong! Webhook is configured correctly.");
    }

    let Some(signature) = header_str(&headers, SIGNATURE_HEADER) else {
        log_error(&updater, "Webhook rejected: missing signature");
        return respond(StatusCode::UNAUTHORIZED, false, "Missing signature header.");
    };

    let secret = updater.config().webhook_secret;
    if !puller_crypto::webhook::verify(&secret, &body, &signature) {
        log_error(&updater, "Webhook rejected: invalid signature");
        return respond(StatusCode::UNAUTHORIZED, false, "Invalid signature.");
    }

    if event.as_deref() != Some("push") {
        log_info(&updater, "Webhook event type not handled");
        return respond(StatusCode::OK, true, "Event type not handled.");
    }

    let Ok(payload) = serde_json::from_slice::<PushPayload>(&body) else {
        log_error(&updater, "Webhook rejected: invalid JSON payload");
        return respond(StatusCode::BAD_REQUEST, false, "Invalid JSON payload.");
    };

    handle_push(updater, payload).await
}

async fn handle_push(updater: Arc<Updater>, payload: PushPayload) -> Response {
    let config = updater.config();
    let pushed_branch = payload
        .git_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(&payload.git_ref);

    if pushed_branch != config.branch {
        log_info(
            &updater,
            &format!(
                "Push to branch {pushed_branch} ignored (configured: {})",
                config.branch
            ),
        );
        return respond(StatusCode::OK, true, "Push to non-tracked branch ignored.");
    }

    if !config.auto_update {
        log_info(&updater, "Push received but auto-update is disabled");
        return respond(
            StatusCode::OK,
            true,
            "Auto-update is disabled. Push notification logged.",
        );
    }

    let short_sha = payload.after.get(..7).unwrap_or(&payload.after);
    let excerpt: String = payload
        .head_commit
        .map(|c| c.message.chars().take(50).collect())
        .unwrap_or_default();
    log_info(&updater, &format!("Processing push: {short_sha} - {excerpt}"));

    match updater.update(LogSource::Webhook).await {
        Ok(_) => respond(StatusCode::OK, true, "Theme updated successfully."),
        Err(err) => respond(StatusCode::INTERNAL_SERVER_ERROR, false, &err.to_string()),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn respond(status: StatusCode, success: bool, message: &str) -> Response {
    (
        status,
        Json(WebhookResponse {
            success,
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn log_info(updater: &Updater, message: &str) {
    updater.record(|log| log.record(message, LogStatus::Info, LogSource::Webhook, Meta::new()));
}

fn log_error(updater: &Updater, message: &str) {
    updater.record(|log| log.record(message, LogStatus::Error, LogSource::Webhook, Meta::new()));
}
