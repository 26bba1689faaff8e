//! HTTP surface: the LINE webhook callback and a health check.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use tower_http::trace::TraceLayer;
use tracing::{Instrument, debug, info_span, warn};
use uuid::Uuid;

use crate::error::WebhookError;
use crate::handler::EventHandler;
use crate::line::webhook::{SIGNATURE_HEADER, parse_events, verify_signature};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub channel_secret: SecretString,
    pub handler: Arc<EventHandler>,
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match self {
            WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::Malformed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

/// Build the Axum router with the webhook and health routes.
pub fn webhook_routes(state: AppState) -> Router {
    Router::new()
        .route("/callback", post(callback))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "kamiq-bot"
    }))
}

// ── Webhook ─────────────────────────────────────────────────────────────

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    if let Err(e) = verify_signature(
        state.channel_secret.expose_secret().as_bytes(),
        &body,
        signature,
    ) {
        warn!("Rejected webhook: {e}");
        return Err(e);
    }

    let events = parse_events(&body).inspect_err(|e| warn!("Unparseable webhook: {e}"))?;

    let span = info_span!("webhook", delivery_id = %Uuid::new_v4(), events = events.len());
    async {
        for event in events {
            debug!(kind = event.kind(), "Handling event");
            state.handler.handle(event).await;
        }
    }
    .instrument(span)
    .await;

    Ok(StatusCode::OK)
}
