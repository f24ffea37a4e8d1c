use async_trait::async_trait;
use std::time::Duration;

use crate::error::NotifyError;
use crate::{NotificationChannel, RenderedMessage};

/// Telegram Bot API delivery: `{chat_id, text}` POSTed to
/// `https://api.telegram.org/bot<token>/sendMessage`.
pub struct TelegramChannel {
    client: reqwest::Client,
    bot_token: String,
    chat_id: String,
    timeout: Duration,
}

impl TelegramChannel {
    pub fn new(
        client: reqwest::Client,
        bot_token: &str,
        chat_id: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
            timeout,
        }
    }

    /// Send an arbitrary text message to the configured chat. Also used
    /// by the admin "test connection" endpoint.
    pub async fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let resp = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Api {
                service: "Telegram".to_string(),
                status: status.as_u16(),
            });
        }

        // The Bot API can answer 200 with ok=false.
        let body: serde_json::Value = resp.json().await?;
        if body.get("ok").and_then(|v| v.as_bool()) == Some(false) {
            let detail = body
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("ok=false")
                .to_string();
            return Err(NotifyError::Rejected {
                service: "Telegram".to_string(),
                detail,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn deliver(&self, message: &RenderedMessage) -> Result<(), NotifyError> {
        self.send_text(&message.text).await
    }

    fn label(&self) -> String {
        format!("Telegram:{}", self.chat_id)
    }
}
