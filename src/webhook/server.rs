//! Axum server that receives provider webhooks.
//!
//! Each request is classified, run through the conversation pipeline,
//! and answered with a small JSON status. The customer reply is sent
//! through the [`Dispatcher`] before the HTTP response is returned.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

use super::payload::{classify_body, Inbound};
use crate::config::GlobalConfig;
use crate::conversation::render::apology;
use crate::conversation::ConversationService;
use crate::persistence::db::Database;
use crate::transport::automation::{AutomationForwarder, TurnEvent};
use crate::transport::Dispatcher;
use crate::{AppError, Result};

/// Shared state for request handlers.
pub struct AppState {
    /// Validated configuration.
    pub config: Arc<GlobalConfig>,
    /// `SQLite` pool.
    pub db: Arc<Database>,
    /// Conversation pipeline.
    pub conversation: ConversationService,
    /// Reply delivery.
    pub dispatcher: Dispatcher,
    /// Turn forwarding.
    pub automation: AutomationForwarder,
}

/// Handler for `GET /health`.
async fn health() -> &'static str {
    "ok"
}

fn status_body(status: &str) -> Json<serde_json::Value> {
    Json(json!({ "status": status }))
}

/// Handler for `POST /webhook`.
async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let (phone, text) = match classify_body(&body) {
        Inbound::Message { phone, text } => (phone, text),
        Inbound::Ignored => return status_body("ignored").into_response(),
        Inbound::NoMessage => return status_body("no_message").into_response(),
    };

    let span = info_span!("webhook", phone = %phone);
    async move {
        match state.conversation.handle_message(&phone, &text).await {
            Ok(turn) => {
                state.dispatcher.send_reply(&phone, &turn.reply).await;
                state
                    .automation
                    .forward(&TurnEvent::new(&phone, &text, &turn))
                    .await;
                Json(json!({ "status": "ok", "state": turn.state })).into_response()
            }
            Err(err) => {
                error!(%err, "conversation pipeline failed");
                state.dispatcher.send_reply(&phone, &apology()).await;
                (StatusCode::INTERNAL_SERVER_ERROR, status_body("error")).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

/// Build the HTTP router.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `config.bind_address:config.http_port` and serve until `ct` fires.
///
/// # Errors
///
/// Returns `AppError::Config` if the address is invalid or the listener
/// cannot bind, or if the server stops with an I/O error.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let bind: SocketAddr = format!("{}:{}", state.config.bind_address, state.config.http_port)
        .parse()
        .map_err(|err| AppError::Config(format!("invalid bind address: {err}")))?;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| AppError::Config(format!("failed to bind webhook on {bind}: {err}")))?;

    info!(%bind, "starting webhook listener");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Config(format!("webhook server error: {err}")))?;

    info!("webhook listener shut down");
    Ok(())
}
