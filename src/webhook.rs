use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Url;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::platform::TelegramApi;

/// Path Telegram POSTs updates to
pub const WEBHOOK_PATH: &str = "/webhook";

/// Build the callback URL from the public base URL.
/// Returns `None` when no base URL is configured.
pub fn webhook_url(base_url: Option<&str>) -> Result<Option<Url>> {
    let base = match base_url.map(str::trim) {
        Some(base) if !base.is_empty() => base,
        _ => return Ok(None),
    };
    let raw = format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH);
    let url = Url::parse(&raw).with_context(|| format!("Invalid webhook base URL: {base}"))?;
    Ok(Some(url))
}

/// Like [`webhook_url`], but an unusable base URL is logged and treated as
/// unset, so the server still starts and answers health checks.
pub fn resolve_webhook_url(base_url: Option<&str>) -> Option<Url> {
    match webhook_url(base_url) {
        Ok(url) => url,
        Err(e) => {
            error!("{:#}; webhook registration disabled", e);
            None
        }
    }
}

/// Owns the webhook registration for the lifetime of the process.
///
/// `start` and `stop` bracket the serving period. Failures are logged and
/// never propagated: without a webhook the process still answers health checks.
pub struct WebhookLifecycle {
    /// Released by `stop`
    session: Mutex<Option<Arc<dyn TelegramApi>>>,
    url: Option<Url>,
    secret: Option<String>,
    registered: AtomicBool,
}

impl WebhookLifecycle {
    pub fn new(api: Arc<dyn TelegramApi>, url: Option<Url>, secret: Option<String>) -> Self {
        Self {
            session: Mutex::new(Some(api)),
            url,
            secret,
            registered: AtomicBool::new(false),
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Register the callback URL, dropping updates queued while we were away.
    pub async fn start(&self) {
        let Some(url) = self.url.clone() else {
            warn!("Webhook base URL is not set; skipping registration, no updates will be delivered");
            return;
        };

        // checked under the lock so concurrent callers register once
        let session = self.session.lock().await;
        let Some(api) = session.as_ref() else {
            warn!("Telegram session already released; not registering webhook");
            return;
        };

        if self.is_registered() {
            debug!(%url, "webhook already registered");
            return;
        }

        match api.set_webhook(url.clone(), self.secret.as_deref(), true).await {
            Ok(()) => {
                self.registered.store(true, Ordering::SeqCst);
                info!(%url, "Webhook set");
            }
            Err(e) => error!(%url, "Failed to set webhook: {:#}", e),
        }
    }

    /// Deregister the webhook if this process registered one, then release
    /// the Telegram session. Safe to call without `start` and more than once.
    pub async fn stop(&self) {
        let Some(api) = self.session.lock().await.take() else {
            debug!("webhook lifecycle already stopped");
            return;
        };

        if self.registered.swap(false, Ordering::SeqCst) {
            match api.delete_webhook(true).await {
                Ok(()) => info!("Webhook deleted"),
                Err(e) => error!("Failed to delete webhook: {:#}", e),
            }
        } else {
            debug!("no webhook registered, skipping deletion");
        }

        drop(api);
        info!("Telegram session closed");
    }
}
