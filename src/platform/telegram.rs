use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use teloxide::{
    payloads::{DeleteWebhookSetters, SendMessageSetters, SetWebhookSetters},
    prelude::*,
    types::{ChatId, MessageId, ReplyParameters, Update, UpdateKind},
};
use tracing::{debug, error, info};

use crate::platform::{MessageEvent, TelegramApi};
use crate::replies;

#[async_trait]
impl TelegramApi for Bot {
    async fn set_webhook(&self, url: Url, secret: Option<&str>, drop_pending: bool) -> Result<()> {
        let mut request = Requester::set_webhook(self, url).drop_pending_updates(drop_pending);
        if let Some(secret) = secret {
            request = request.secret_token(secret.to_string());
        }
        request.await.context("setWebhook request failed")?;
        Ok(())
    }

    async fn delete_webhook(&self, drop_pending: bool) -> Result<()> {
        Requester::delete_webhook(self)
            .drop_pending_updates(drop_pending)
            .await
            .context("deleteWebhook request failed")?;
        Ok(())
    }

    async fn send_reply(&self, chat_id: ChatId, reply_to: MessageId, text: &str) -> Result<()> {
        self.send_message(chat_id, text)
            .reply_parameters(ReplyParameters::new(reply_to))
            .await
            .context("sendMessage request failed")?;
        Ok(())
    }
}

impl MessageEvent {
    /// Extract the message carried by an update. Only new messages count;
    /// edits, callback queries and everything else are ignored.
    pub fn from_update(update: Update) -> Option<Self> {
        match update.kind {
            UpdateKind::Message(msg) => Some(Self {
                chat_id: msg.chat.id,
                message_id: msg.id,
                text: msg.text().map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// Answer a recognized phrase with a threaded reply; stay silent otherwise.
///
/// A failed send is logged and dropped. Returns the answer that was chosen,
/// whether or not it reached Telegram.
pub async fn handle(api: &dyn TelegramApi, event: &MessageEvent) -> Option<&'static str> {
    let Some(reply) = replies::reply_for(event.text.as_deref()) else {
        debug!(chat_id = event.chat_id.0, "no matching phrase, staying silent");
        return None;
    };

    match api.send_reply(event.chat_id, event.message_id, reply).await {
        Ok(()) => info!(
            chat_id = event.chat_id.0,
            message_id = event.message_id.0,
            "reply sent"
        ),
        Err(e) => error!(
            chat_id = event.chat_id.0,
            message_id = event.message_id.0,
            "Failed to send reply: {:#}",
            e
        ),
    }

    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{
        edited_update_body, location_update_body, text_update_body, Call, RecordingApi, CHAT_ID,
        MESSAGE_ID,
    };

    fn event(text: Option<&str>) -> MessageEvent {
        MessageEvent {
            chat_id: ChatId(218485655),
            message_id: MessageId(6557),
            text: text.map(str::to_string),
        }
    }

    // teloxide only decodes updates from a JSON string, not from a `Value`
    fn parse(body: &str) -> Update {
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn test_recognized_phrase_sends_threaded_reply() {
        let api = RecordingApi::default();

        let reply = handle(&api, &event(Some("Да"))).await;

        assert_eq!(reply, Some("в кране черная вода!"));
        assert_eq!(
            api.calls(),
            vec![Call::SendReply {
                chat_id: ChatId(218485655),
                reply_to: MessageId(6557),
                text: "в кране черная вода!".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_unrecognized_phrase_sends_nothing() {
        let api = RecordingApi::default();

        assert_eq!(handle(&api, &event(Some("да ладно"))).await, None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_text_sends_nothing() {
        let api = RecordingApi::default();

        assert_eq!(handle(&api, &event(None)).await, None);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_is_swallowed() {
        let api = RecordingApi {
            fail_send: true,
            ..Default::default()
        };

        let reply = handle(&api, &event(Some(" нет \n"))).await;

        assert_eq!(reply, Some("с-маркетинга ответ!"));
        assert_eq!(api.calls().len(), 1);
    }

    #[test]
    fn test_event_from_text_update() {
        let event = MessageEvent::from_update(parse(&text_update_body("Не Знаю"))).unwrap();
        assert_eq!(event.chat_id, ChatId(CHAT_ID));
        assert_eq!(event.message_id, MessageId(MESSAGE_ID));
        assert_eq!(event.text.as_deref(), Some("Не Знаю"));
    }

    #[test]
    fn test_event_without_text() {
        let event = MessageEvent::from_update(parse(&location_update_body())).unwrap();
        assert_eq!(event.chat_id, ChatId(CHAT_ID));
        assert_eq!(event.text, None);
    }

    #[test]
    fn test_edited_message_yields_no_event() {
        assert_eq!(MessageEvent::from_update(parse(&edited_update_body("да"))), None);
    }
}
