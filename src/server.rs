use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use teloxide::types::Update;
use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::platform::{telegram, MessageEvent, TelegramApi};
use crate::webhook::WEBHOOK_PATH;

/// Header Telegram uses to echo the secret given at registration
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared state handed to the request handlers
#[derive(Clone)]
pub struct AppState {
    api: Arc<dyn TelegramApi>,
    secret: Option<String>,
}

impl AppState {
    pub fn new(api: Arc<dyn TelegramApi>, secret: Option<String>) -> Self {
        Self { api, secret }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route(WEBHOOK_PATH, post(receive_update))
        .with_state(state)
}

/// Liveness probe for the hosting platform. Independent of webhook state.
async fn health() -> &'static str {
    "Bot is running"
}

/// Telegram update endpoint. Always acknowledges with 200, including for
/// bodies that do not decode, so Telegram does not redeliver updates we
/// cannot use.
///
/// The one exception is opt-in: when a webhook secret is configured, a
/// request without the matching secret header gets 401 and is not processed.
/// With no secret every request is accepted.
async fn receive_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    if let Some(expected) = state.secret.as_deref() {
        let provided = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            warn!("Rejected webhook request with missing or wrong secret token");
            return (StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(bytes = body.len(), "Ignoring undecodable update: {}", e);
            return (StatusCode::OK, "OK");
        }
    };

    debug!(update_id = update.id.0, "received update");
    match MessageEvent::from_update(update) {
        Some(event) => {
            telegram::handle(state.api.as_ref(), &event).await;
        }
        None => debug!("update carries no new message, ignoring"),
    }

    (StatusCode::OK, "OK")
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
