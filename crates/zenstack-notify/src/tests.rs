use chrono::{TimeZone, Utc};
use zenstack_common::types::{EventKind, MonitoredDomain, SslStatus};

use crate::channels::webhook::WebhookChannel;
use crate::notifier::{fallback_text, substitution_map};
use crate::RenderedMessage;

fn fixture_domain() -> MonitoredDomain {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    MonitoredDomain {
        id: "1".to_string(),
        domain_name: "x.example.com".to_string(),
        ssl_expiry: Some(Utc.with_ymd_and_hms(2025, 1, 4, 6, 0, 0).unwrap()),
        ssl_status: SslStatus::Critical,
        issuer_org: Some("Let's Encrypt".to_string()),
        registrar: Some("MarkMonitor Inc.".to_string()),
        domain_expiry: None,
        name_servers: vec![],
        is_live: false,
        last_status_code: 0,
        response_time_ms: 120,
        auto_renew: false,
        last_check_at: Some(now),
        last_notification_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_substitution_map_covers_contract_keys() {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let data = substitution_map(&fixture_domain(), now);

    for key in [
        "domain",
        "status",
        "status_code",
        "code",
        "days",
        "days_remaining",
        "expiry",
        "expiry_date",
        "registrar",
        "ssl_status",
    ] {
        assert!(data.contains_key(key), "missing key: {key}");
    }

    assert_eq!(data["domain"], "x.example.com");
    assert_eq!(data["status"], "0");
    // 3.25 days out rounds up to 4
    assert_eq!(data["days_remaining"], "4");
    assert_eq!(data["expiry_date"], "2025-01-04");
    assert_eq!(data["expiry"], "2025-01-04 06:00:00");
    assert_eq!(data["ssl_status"], "Critical");
    assert_eq!(data["registrar"], "MarkMonitor Inc.");
}

#[test]
fn test_site_down_fallback_message() {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let data = substitution_map(&fixture_domain(), now);
    assert_eq!(
        fallback_text(EventKind::SiteDown, &data),
        "🚨 告警：站点 x.example.com 无法访问！状态码：0"
    );
}

#[test]
fn test_ssl_critical_fallback_message() {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let data = substitution_map(&fixture_domain(), now);
    assert_eq!(
        fallback_text(EventKind::SslCritical, &data),
        "🔒 证书预警：域名 x.example.com 的 SSL 证书将在 4 天后过期。"
    );
}

#[test]
fn test_webhook_payload_shape() {
    let time = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    let message = RenderedMessage {
        event: EventKind::SslCritical,
        domain_name: "x.example.com".to_string(),
        title: "SSL Certificate Warning".to_string(),
        body: "expiring".to_string(),
        text: "expiring".to_string(),
        time,
        extra: serde_json::json!({
            "ssl_expiry": "2025-01-04T06:00:00+00:00",
            "ssl_status": "Critical",
            "days_remaining": 4,
            "registrar": "MarkMonitor Inc.",
        }),
    };

    let payload = WebhookChannel::payload(&message);
    assert_eq!(payload["title"], "SSL Certificate Warning");
    assert_eq!(payload["event"], "SSL_CRITICAL");
    assert_eq!(payload["domain"], "x.example.com");
    assert_eq!(payload["time"], time.to_rfc3339());
    assert_eq!(payload["extra"]["days_remaining"], 4);
    assert_eq!(payload["extra"]["ssl_status"], "Critical");
}
