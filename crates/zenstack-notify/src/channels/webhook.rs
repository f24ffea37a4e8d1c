use async_trait::async_trait;
use std::time::Duration;
use zenstack_common::types::{NotificationConfig, Platform};

use crate::error::NotifyError;
use crate::{NotificationChannel, RenderedMessage};

/// Webhook delivery for DingTalk, Feishu, Slack, and generic endpoints.
///
/// The payload is identical across platforms; only the auth header
/// differs. Slack and generic webhooks get `Authorization: Bearer`,
/// DingTalk and Feishu get `X-Secret-Key`.
pub struct WebhookChannel {
    client: reqwest::Client,
    platform: Platform,
    platform_name: String,
    endpoint: String,
    secret: Option<String>,
    timeout: Duration,
}

impl WebhookChannel {
    pub fn new(client: reqwest::Client, config: &NotificationConfig, timeout: Duration) -> Self {
        Self {
            client,
            platform: Platform::parse(&config.platform),
            platform_name: config.platform.clone(),
            endpoint: config.endpoint.clone(),
            secret: config.secret.clone(),
            timeout,
        }
    }

    pub(crate) fn payload(message: &RenderedMessage) -> serde_json::Value {
        serde_json::json!({
            "title": message.title,
            "body": message.body,
            "event": message.event.event_name(),
            "domain": message.domain_name,
            "time": message.time.to_rfc3339(),
            "extra": message.extra,
        })
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let Some(secret) = self.secret.as_deref().filter(|s| !s.is_empty()) else {
            return req;
        };
        match self.platform {
            Platform::Slack => req.header("Authorization", format!("Bearer {secret}")),
            Platform::DingTalk | Platform::Feishu => req.header("X-Secret-Key", secret),
            _ => req.header("Authorization", format!("Bearer {secret}")),
        }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn deliver(&self, message: &RenderedMessage) -> Result<(), NotifyError> {
        let payload = Self::payload(message);
        let req = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&payload)
            .timeout(self.timeout);

        let resp = self.apply_auth(req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Api {
                service: self.platform_name.clone(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    fn label(&self) -> String {
        format!("{}:{}", self.platform_name, self.endpoint)
    }
}
