use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowercase a domain name and strip surrounding whitespace and the
/// trailing dot. Stored names are always in this form.
pub fn normalize_domain(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Days until `not_after`, as the ceiling of the hour difference divided
/// by 24. "1.2 days remaining" reads as 2; an instant in the past gives a
/// negative count.
pub fn days_remaining(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (not_after - now).num_seconds() as f64;
    (secs / 86_400.0).ceil() as i64
}

/// TLS lifecycle classification of a monitored domain.
///
/// `Offline` means the TLS dial itself failed; it is unrelated to HTTP
/// liveness, which is tracked separately on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SslStatus {
    Valid,
    Warning,
    Critical,
    Expired,
    Offline,
}

impl SslStatus {
    /// True for the statuses the scan summary counts as at-risk.
    pub fn is_at_risk(self) -> bool {
        matches!(
            self,
            SslStatus::Warning | SslStatus::Critical | SslStatus::Expired
        )
    }
}

impl std::fmt::Display for SslStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SslStatus::Valid => write!(f, "Valid"),
            SslStatus::Warning => write!(f, "Warning"),
            SslStatus::Critical => write!(f, "Critical"),
            SslStatus::Expired => write!(f, "Expired"),
            SslStatus::Offline => write!(f, "Offline"),
        }
    }
}

impl std::str::FromStr for SslStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Valid" => Ok(SslStatus::Valid),
            "Warning" => Ok(SslStatus::Warning),
            "Critical" => Ok(SslStatus::Critical),
            "Expired" => Ok(SslStatus::Expired),
            "Offline" => Ok(SslStatus::Offline),
            _ => Err(format!("unknown ssl status: {s}")),
        }
    }
}

/// Why a probe failed, classified at the layer where the failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeErrorKind {
    Dns,
    Timeout,
    Tcp,
    Tls,
}

impl std::fmt::Display for ProbeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeErrorKind::Dns => write!(f, "dns"),
            ProbeErrorKind::Timeout => write!(f, "timeout"),
            ProbeErrorKind::Tcp => write!(f, "tcp"),
            ProbeErrorKind::Tls => write!(f, "tls"),
        }
    }
}

/// Result of one TLS dial against `domain:443`.
///
/// A failed dial is still a valid observation: `reachable` is false and
/// `error` carries the classified failure kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsObservation {
    pub domain: String,
    pub reachable: bool,
    pub not_after: Option<DateTime<Utc>>,
    pub issuer_org: Option<String>,
    pub error: Option<ProbeErrorKind>,
}

impl TlsObservation {
    pub fn unreachable(domain: &str, kind: ProbeErrorKind) -> Self {
        Self {
            domain: domain.to_string(),
            reachable: false,
            not_after: None,
            issuer_org: None,
            error: Some(kind),
        }
    }
}

/// Result of one HTTP liveness probe (https first, then http).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpObservation {
    pub domain: String,
    pub is_live: bool,
    pub status_code: i32,
    pub response_time_ms: i32,
}

/// Registration data for the registrable apex of a domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhoisInfo {
    pub registrar: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub nameservers: Vec<String>,
}

/// One monitored domain as seen by API consumers and the state engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredDomain {
    pub id: String,
    pub domain_name: String,
    pub ssl_expiry: Option<DateTime<Utc>>,
    pub ssl_status: SslStatus,
    pub issuer_org: Option<String>,
    pub registrar: Option<String>,
    pub domain_expiry: Option<DateTime<Utc>>,
    pub name_servers: Vec<String>,
    pub is_live: bool,
    pub last_status_code: i32,
    pub response_time_ms: i32,
    pub auto_renew: bool,
    pub last_check_at: Option<DateTime<Utc>>,
    pub last_notification_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field-level patch applied by `Store::upsert_domain`.
///
/// `None` leaves the stored value untouched; the inner `Option` on
/// nullable columns distinguishes "set to null" from "leave alone".
#[derive(Debug, Clone, Default)]
pub struct DomainPatch {
    pub ssl_expiry: Option<Option<DateTime<Utc>>>,
    pub ssl_status: Option<SslStatus>,
    pub issuer_org: Option<Option<String>>,
    pub registrar: Option<String>,
    pub domain_expiry: Option<DateTime<Utc>>,
    pub name_servers: Option<Vec<String>>,
    pub is_live: Option<bool>,
    pub last_status_code: Option<i32>,
    pub response_time_ms: Option<i32>,
    pub auto_renew: Option<bool>,
    pub last_check_at: Option<DateTime<Utc>>,
    pub last_notification_at: Option<DateTime<Utc>>,
}

/// Classification boundary crossings emitted by the state engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    SiteDown,
    SiteRecovered,
    SslCritical,
    SslWarning,
}

impl EventKind {
    /// Wire name, also the `message_templates.event_name` key.
    pub fn event_name(self) -> &'static str {
        match self {
            EventKind::SiteDown => "SITE_DOWN",
            EventKind::SiteRecovered => "SITE_RECOVERED",
            EventKind::SslCritical => "SSL_CRITICAL",
            EventKind::SslWarning => "SSL_WARNING",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

/// An event together with the persisted record that produced it. The
/// record is the post-write view, so the notifier renders from exactly
/// what was stored.
#[derive(Debug, Clone)]
pub struct TransitionEvent {
    pub kind: EventKind,
    pub domain: MonitoredDomain,
}

/// Outbound notification platforms. Unknown strings fall back to the
/// generic webhook treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    DingTalk,
    Feishu,
    Slack,
    Webhook,
    Telegram,
}

impl Platform {
    pub fn parse(s: &str) -> Platform {
        match s.to_ascii_lowercase().as_str() {
            "dingtalk" => Platform::DingTalk,
            "feishu" => Platform::Feishu,
            "slack" => Platform::Slack,
            "telegram" => Platform::Telegram,
            _ => Platform::Webhook,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::DingTalk => write!(f, "DingTalk"),
            Platform::Feishu => write!(f, "Feishu"),
            Platform::Slack => write!(f, "Slack"),
            Platform::Webhook => write!(f, "Webhook"),
            Platform::Telegram => write!(f, "Telegram"),
        }
    }
}

/// Webhook endpoint configuration row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub id: String,
    pub platform: String,
    pub endpoint: String,
    pub secret: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Message template row, unique per event name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub id: String,
    pub event_name: String,
    pub title_template: String,
    pub body_template: String,
    pub text_template: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Telegram bot configuration row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub id: String,
    pub bot_token: String,
    pub chat_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one delivery attempt to one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: String,
    pub event_name: String,
    pub domain_name: String,
    pub channel: String,
    pub ok: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Platform user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("  Example.COM. "), "example.com");
        assert_eq!(normalize_domain("api.internal.example.co.uk"), "api.internal.example.co.uk");
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        // 1.2 days ahead reads as 2
        let not_after = now + chrono::Duration::hours(29);
        assert_eq!(days_remaining(not_after, now), 2);
        // exactly 3 days reads as 3
        let not_after = now + chrono::Duration::days(3);
        assert_eq!(days_remaining(not_after, now), 3);
        // one day in the past reads as -1
        let not_after = now - chrono::Duration::days(1);
        assert_eq!(days_remaining(not_after, now), -1);
    }

    #[test]
    fn test_ssl_status_round_trip() {
        for s in [
            SslStatus::Valid,
            SslStatus::Warning,
            SslStatus::Critical,
            SslStatus::Expired,
            SslStatus::Offline,
        ] {
            assert_eq!(s.to_string().parse::<SslStatus>().unwrap(), s);
        }
        assert!("valid".parse::<SslStatus>().is_err());
    }

    #[test]
    fn test_platform_parse_defaults_to_webhook() {
        assert_eq!(Platform::parse("DingTalk"), Platform::DingTalk);
        assert_eq!(Platform::parse("slack"), Platform::Slack);
        assert_eq!(Platform::parse("something-else"), Platform::Webhook);
    }
}
