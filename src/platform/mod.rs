pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use teloxide::types::{ChatId, MessageId};

/// An inbound message, reduced to what the responder needs
#[derive(Debug, Clone, PartialEq)]
pub struct MessageEvent {
    /// Chat the answer goes back to
    pub chat_id: ChatId,
    /// Message the answer is threaded under
    pub message_id: MessageId,
    /// The message text, absent for stickers, photos and the like
    pub text: Option<String>,
}

/// Outbound calls made against the Telegram Bot API
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Point Telegram at `url`. `secret` is echoed back by Telegram in
    /// every webhook request.
    async fn set_webhook(&self, url: Url, secret: Option<&str>, drop_pending: bool) -> Result<()>;

    async fn delete_webhook(&self, drop_pending: bool) -> Result<()>;

    /// Send `text` to `chat_id` as a reply to `reply_to`.
    async fn send_reply(&self, chat_id: ChatId, reply_to: MessageId, text: &str) -> Result<()>;
}
