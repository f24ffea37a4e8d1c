/// Errors that can occur while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The HTTP request to the channel endpoint failed outright.
    #[error("Notify: HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The external API answered with a non-success response.
    #[error("Notify: {service} returned status {status}")]
    Api { service: String, status: u16 },

    /// The external API answered 2xx but reported a logical failure
    /// (e.g. Telegram `ok: false`).
    #[error("Notify: {service} rejected the message: {detail}")]
    Rejected { service: String, detail: String },
}
