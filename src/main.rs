mod config;
mod platform;
mod replies;
mod server;
mod webhook;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::platform::TelegramApi;
use crate::server::AppState;
use crate::webhook::WebhookLifecycle;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,webhook_responder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional TOML file, environment variables take precedence
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    if let Some(path) = &config_path {
        info!("Loading configuration from: {}", path.display());
    }
    let config = Config::load(config_path.as_deref()).context("Failed to load configuration")?;

    let webhook_url = webhook::resolve_webhook_url(config.telegram.webhook_base_url.as_deref());
    info!("Configuration loaded successfully");
    info!("  Listen: {}", config.server.bind_addr());
    match &webhook_url {
        Some(url) => info!("  Webhook: {}", url),
        None => info!("  Webhook: disabled"),
    }

    let bot: Arc<dyn TelegramApi> = Arc::new(Bot::new(&config.telegram.bot_token));
    let lifecycle = WebhookLifecycle::new(
        Arc::clone(&bot),
        webhook_url,
        config.telegram.webhook_secret.clone(),
    );
    let app = server::router(AppState::new(bot, config.telegram.webhook_secret.clone()));

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Bot is listening on {}", addr);

    lifecycle.start().await;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(server::shutdown_signal())
        .await;

    lifecycle.stop().await;

    served.context("Server error")?;
    Ok(())
}
