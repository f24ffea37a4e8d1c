//! Notification fan-out for transition events.
//!
//! Events rendered through the message templates are posted to every
//! active webhook configuration and Telegram bot. A single successful
//! channel counts the event as delivered; individual failures are logged
//! with the channel identity and never halt the fan-out.

pub mod channels;
pub mod error;
pub mod notifier;
pub mod template;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use zenstack_common::types::EventKind;

pub use error::NotifyError;
pub use notifier::{Notifier, NotifierConfig};

/// A fully rendered notification, ready for any channel.
///
/// `title`/`body` feed the webhook payload; `text` is the plain-text
/// rendering used by Telegram.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub event: EventKind,
    pub domain_name: String,
    pub title: String,
    pub body: String,
    pub text: String,
    pub time: DateTime<Utc>,
    pub extra: serde_json::Value,
}

/// A delivery channel for rendered notifications.
///
/// Implementations are constructed per fan-out from the stored
/// configuration rows, so config edits take effect on the next event
/// without a reload step.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver the message. An `Err` marks this channel failed for the
    /// current event only.
    async fn deliver(&self, message: &RenderedMessage) -> Result<(), NotifyError>;

    /// Channel identity used in logs and delivery records.
    fn label(&self) -> String;
}
