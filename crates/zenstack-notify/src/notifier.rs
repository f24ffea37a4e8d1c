use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use zenstack_common::types::{
    days_remaining, DomainPatch, EventKind, MonitoredDomain, TransitionEvent,
};
use zenstack_storage::Store;

use crate::channels::telegram::TelegramChannel;
use crate::channels::webhook::WebhookChannel;
use crate::template::render;
use crate::{NotificationChannel, RenderedMessage};

/// Delivery policy knobs, read-only after boot.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub webhook_timeout: Duration,
    pub telegram_timeout: Duration,
    /// Minimum interval between SSL_CRITICAL notifications for one name.
    pub renotify_window: ChronoDuration,
    /// Whether SITE_RECOVERED events produce a notification.
    pub notify_on_recovery: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_timeout: Duration::from_secs(10),
            telegram_timeout: Duration::from_secs(15),
            renotify_window: ChronoDuration::hours(24),
            notify_on_recovery: false,
        }
    }
}

/// Consumes transition events, renders templates, and fans out to every
/// configured channel.
pub struct Notifier {
    store: Arc<Store>,
    client: reqwest::Client,
    config: NotifierConfig,
    /// Event kinds whose missing template was already logged.
    missing_template_logged: Mutex<HashSet<&'static str>>,
}

impl Notifier {
    pub fn new(store: Arc<Store>, config: NotifierConfig) -> Self {
        Self {
            store,
            client: reqwest::Client::new(),
            config,
            missing_template_logged: Mutex::new(HashSet::new()),
        }
    }

    /// Handle one transition event end to end.
    ///
    /// Delivery counts as successful when at least one channel accepted
    /// the message; only then does the SSL_CRITICAL dedup clock advance.
    pub async fn dispatch(&self, event: &TransitionEvent) {
        let domain = &event.domain;

        match event.kind {
            EventKind::SiteRecovered if !self.config.notify_on_recovery => {
                tracing::debug!(
                    domain = %domain.domain_name,
                    "SITE_RECOVERED emitted but recovery notifications are off"
                );
                return;
            }
            EventKind::SslCritical => {
                if let Some(last) = domain.last_notification_at {
                    if Utc::now() - last < self.config.renotify_window {
                        tracing::debug!(
                            domain = %domain.domain_name,
                            last_notification = %last,
                            "SSL_CRITICAL suppressed, renotify window not elapsed"
                        );
                        return;
                    }
                }
            }
            _ => {}
        }

        let message = self.render_event(event).await;
        let delivered = self.fan_out(&message).await;

        if delivered == 0 {
            tracing::warn!(
                event = %event.kind,
                domain = %domain.domain_name,
                "Notification failed on every channel"
            );
            return;
        }

        tracing::info!(
            event = %event.kind,
            domain = %domain.domain_name,
            delivered,
            "Notification delivered"
        );

        if event.kind == EventKind::SslCritical {
            let patch = DomainPatch {
                last_notification_at: Some(Utc::now()),
                ..Default::default()
            };
            if let Err(e) = self.store.upsert_domain(&domain.domain_name, &patch).await {
                tracing::error!(
                    domain = %domain.domain_name,
                    error = %e,
                    "Failed to record last_notification_at"
                );
            }
        }
    }

    /// Send a fixed connectivity check through one Telegram config.
    pub async fn send_telegram_test(
        &self,
        bot_token: &str,
        chat_id: &str,
    ) -> Result<(), crate::NotifyError> {
        let channel = TelegramChannel::new(
            self.client.clone(),
            bot_token,
            chat_id,
            self.config.telegram_timeout,
        );
        channel
            .send_text("✅ ZenStack notification test: this chat is configured correctly.")
            .await
    }

    async fn render_event(&self, event: &TransitionEvent) -> RenderedMessage {
        let domain = &event.domain;
        let now = Utc::now();
        let data = substitution_map(domain, now);

        let template = match self
            .store
            .get_template_by_event(event.kind.event_name())
            .await
        {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(event = %event.kind, error = %e, "Template lookup failed");
                None
            }
        };

        let fallback = fallback_text(event.kind, &data);
        let (title, body, text) = match template {
            Some(t) => {
                let title = render(&t.title_template, &data);
                let body = render(&t.body_template, &data);
                let text = render(&t.text_template, &data);
                let title = if title.is_empty() {
                    default_title(event.kind).to_string()
                } else {
                    title
                };
                let body = if body.is_empty() { fallback.clone() } else { body };
                let text = if text.is_empty() { body.clone() } else { text };
                (title, body, text)
            }
            None => {
                let mut logged = self
                    .missing_template_logged
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if logged.insert(event.kind.event_name()) {
                    tracing::warn!(
                        event = %event.kind,
                        "No message template configured, using built-in fallback"
                    );
                }
                (
                    default_title(event.kind).to_string(),
                    fallback.clone(),
                    fallback.clone(),
                )
            }
        };

        let days = domain
            .ssl_expiry
            .map(|e| days_remaining(e, now))
            .unwrap_or(0);
        let extra = serde_json::json!({
            "ssl_expiry": domain.ssl_expiry.map(|e| e.to_rfc3339()),
            "ssl_status": domain.ssl_status.to_string(),
            "days_remaining": days,
            "registrar": domain.registrar.clone().unwrap_or_default(),
        });

        RenderedMessage {
            event: event.kind,
            domain_name: domain.domain_name.clone(),
            title,
            body,
            text,
            time: now,
            extra,
        }
    }

    /// Fan out to every active channel. Returns how many accepted.
    async fn fan_out(&self, message: &RenderedMessage) -> usize {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        match self.store.list_active_notification_configs().await {
            Ok(configs) => {
                for cfg in &configs {
                    channels.push(Box::new(WebhookChannel::new(
                        self.client.clone(),
                        cfg,
                        self.config.webhook_timeout,
                    )));
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load notification configs");
            }
        }

        match self.store.list_active_telegram_configs().await {
            Ok(configs) => {
                for cfg in &configs {
                    channels.push(Box::new(TelegramChannel::new(
                        self.client.clone(),
                        &cfg.bot_token,
                        &cfg.chat_id,
                        self.config.telegram_timeout,
                    )));
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load Telegram configs");
            }
        }

        let mut delivered = 0usize;
        for channel in &channels {
            let label = channel.label();
            let outcome = channel.deliver(message).await;
            let (ok, err_text) = match &outcome {
                Ok(()) => (true, None),
                Err(e) => {
                    tracing::warn!(channel = %label, error = %e, "Channel delivery failed");
                    (false, Some(e.to_string()))
                }
            };
            if ok {
                delivered += 1;
            }
            if let Err(e) = self
                .store
                .insert_delivery_record(
                    message.event.event_name(),
                    &message.domain_name,
                    &label,
                    ok,
                    err_text.as_deref(),
                )
                .await
            {
                tracing::error!(channel = %label, error = %e, "Failed to record delivery");
            }
        }
        delivered
    }
}

/// Substitution map per the template contract. All values are strings;
/// several keys alias the same value so operator templates keep working.
pub(crate) fn substitution_map(
    domain: &MonitoredDomain,
    now: chrono::DateTime<Utc>,
) -> HashMap<String, String> {
    let mut data = HashMap::new();
    data.insert("domain".to_string(), domain.domain_name.clone());

    let code = domain.last_status_code.to_string();
    data.insert("status".to_string(), code.clone());
    data.insert("status_code".to_string(), code.clone());
    data.insert("code".to_string(), code);

    let days = domain
        .ssl_expiry
        .map(|e| days_remaining(e, now))
        .unwrap_or(0)
        .to_string();
    data.insert("days".to_string(), days.clone());
    data.insert("days_remaining".to_string(), days);

    let (expiry, expiry_date) = match domain.ssl_expiry {
        Some(e) => (
            e.format("%Y-%m-%d %H:%M:%S").to_string(),
            e.format("%Y-%m-%d").to_string(),
        ),
        None => (String::new(), String::new()),
    };
    data.insert("expiry".to_string(), expiry);
    data.insert("expiry_date".to_string(), expiry_date);

    data.insert(
        "registrar".to_string(),
        domain.registrar.clone().unwrap_or_default(),
    );
    data.insert("ssl_status".to_string(), domain.ssl_status.to_string());
    data
}

pub(crate) fn default_title(kind: EventKind) -> &'static str {
    match kind {
        EventKind::SiteDown => "Site Down Alert",
        EventKind::SiteRecovered => "Site Recovered",
        EventKind::SslCritical => "SSL Certificate Warning",
        EventKind::SslWarning => "SSL Certificate Notice",
    }
}

/// Hard-coded per-event fallback used when no template row exists.
pub(crate) fn fallback_text(kind: EventKind, data: &HashMap<String, String>) -> String {
    let domain = data.get("domain").cloned().unwrap_or_default();
    let code = data.get("status_code").cloned().unwrap_or_default();
    let days = data.get("days_remaining").cloned().unwrap_or_default();
    match kind {
        EventKind::SiteDown => {
            format!("🚨 告警：站点 {domain} 无法访问！状态码：{code}")
        }
        EventKind::SiteRecovered => {
            format!("✅ 恢复：站点 {domain} 已恢复访问。")
        }
        EventKind::SslCritical => {
            format!("🔒 证书预警：域名 {domain} 的 SSL 证书将在 {days} 天后过期。")
        }
        EventKind::SslWarning => {
            format!("🔔 提醒：域名 {domain} 的 SSL 证书将在 {days} 天后过期。")
        }
    }
}
