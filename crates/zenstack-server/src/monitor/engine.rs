use chrono::{DateTime, Duration, Utc};
use zenstack_common::types::{
    days_remaining, DomainPatch, EventKind, HttpObservation, MonitoredDomain, SslStatus,
    TlsObservation, WhoisInfo,
};

/// Classification thresholds in days. The single source of truth: nothing
/// else in the system compares `days_remaining` to a constant.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub critical_days: i64,
    pub warning_days: i64,
    /// Minimum spacing between SSL_CRITICAL events for one name.
    pub renotify_window: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical_days: 7,
            warning_days: 30,
            renotify_window: Duration::hours(24),
        }
    }
}

/// TLS status from one observation.
///
/// Expiration is decided on the raw instant before any day arithmetic, so
/// a certificate that lapsed an hour ago is Expired even though the
/// ceiling of its day count is 0.
pub fn classify(obs: &TlsObservation, now: DateTime<Utc>, th: &Thresholds) -> SslStatus {
    if !obs.reachable {
        return SslStatus::Offline;
    }
    let Some(not_after) = obs.not_after else {
        return SslStatus::Offline;
    };
    if not_after <= now {
        return SslStatus::Expired;
    }
    let days = days_remaining(not_after, now);
    if days < th.critical_days {
        SslStatus::Critical
    } else if days < th.warning_days {
        SslStatus::Warning
    } else {
        SslStatus::Valid
    }
}

/// Map a TLS/WHOIS observation onto the prior record: the patch to
/// persist plus the transition events the write should emit.
///
/// The caller persists the patch first and only emits the events when the
/// write succeeded.
pub fn apply_tls(
    prior: Option<&MonitoredDomain>,
    obs: &TlsObservation,
    whois: &WhoisInfo,
    now: DateTime<Utc>,
    th: &Thresholds,
) -> (DomainPatch, Vec<EventKind>) {
    let status = classify(obs, now, th);

    let mut patch = DomainPatch {
        ssl_expiry: Some(obs.not_after),
        ssl_status: Some(status),
        issuer_org: Some(obs.issuer_org.clone()),
        last_check_at: Some(now),
        ..Default::default()
    };
    // WHOIS fields only overwrite when the lookup produced something;
    // an empty answer must not clobber known registration data.
    if let Some(registrar) = &whois.registrar {
        patch.registrar = Some(registrar.clone());
    }
    if let Some(expires) = whois.expires_at {
        patch.domain_expiry = Some(expires);
    }
    if !whois.nameservers.is_empty() {
        patch.name_servers = Some(whois.nameservers.clone());
    }

    let prior_status = prior.map(|d| d.ssl_status);
    let mut events = Vec::new();

    match status {
        SslStatus::Critical | SslStatus::Expired => {
            let was_critical = matches!(
                prior_status,
                Some(SslStatus::Critical) | Some(SslStatus::Expired)
            );
            let renotify_due = match prior.and_then(|d| d.last_notification_at) {
                Some(last) => now - last >= th.renotify_window,
                None => true,
            };
            if !was_critical || renotify_due {
                events.push(EventKind::SslCritical);
            }
        }
        SslStatus::Warning => {
            let was_at_risk = matches!(
                prior_status,
                Some(SslStatus::Warning) | Some(SslStatus::Critical) | Some(SslStatus::Expired)
            );
            if !was_at_risk {
                events.push(EventKind::SslWarning);
            }
        }
        SslStatus::Valid | SslStatus::Offline => {}
    }

    (patch, events)
}

/// Map an HTTP liveness observation onto the prior record.
pub fn apply_http(
    prior: Option<&MonitoredDomain>,
    obs: &HttpObservation,
) -> (DomainPatch, Vec<EventKind>) {
    let patch = DomainPatch {
        is_live: Some(obs.is_live),
        last_status_code: Some(obs.status_code),
        response_time_ms: Some(obs.response_time_ms),
        ..Default::default()
    };

    let mut events = Vec::new();
    if let Some(prior) = prior {
        if prior.is_live && !obs.is_live {
            events.push(EventKind::SiteDown);
        } else if !prior.is_live && obs.is_live {
            events.push(EventKind::SiteRecovered);
        }
    }

    (patch, events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn obs(not_after: Option<DateTime<Utc>>) -> TlsObservation {
        TlsObservation {
            domain: "example.com".to_string(),
            reachable: not_after.is_some(),
            not_after,
            issuer_org: Some("Let's Encrypt".to_string()),
            error: None,
        }
    }

    fn record(
        ssl_status: SslStatus,
        is_live: bool,
        last_notification_at: Option<DateTime<Utc>>,
    ) -> MonitoredDomain {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        MonitoredDomain {
            id: "1".to_string(),
            domain_name: "example.com".to_string(),
            ssl_expiry: None,
            ssl_status,
            issuer_org: None,
            registrar: None,
            domain_expiry: None,
            name_servers: vec![],
            is_live,
            last_status_code: if is_live { 200 } else { 0 },
            response_time_ms: 0,
            auto_renew: false,
            last_check_at: None,
            last_notification_at,
            created_at: now,
            updated_at: now,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_classify_valid_far_from_expiry() {
        // 73.5 days out: days_remaining rounds up to 74, comfortably Valid.
        let not_after = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        let o = obs(Some(not_after));
        assert_eq!(days_remaining(not_after, now()), 74);
        assert_eq!(classify(&o, now(), &Thresholds::default()), SslStatus::Valid);
    }

    #[test]
    fn test_classify_warning_band() {
        // 19.5 days out rounds to 20: inside [7, 30).
        let not_after = Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap();
        let o = obs(Some(not_after));
        assert_eq!(days_remaining(not_after, now()), 20);
        assert_eq!(
            classify(&o, now(), &Thresholds::default()),
            SslStatus::Warning
        );
    }

    #[test]
    fn test_classify_critical_band() {
        // 3.25 days out rounds to 4: below the 7-day threshold.
        let not_after = Utc.with_ymd_and_hms(2025, 1, 4, 6, 0, 0).unwrap();
        let o = obs(Some(not_after));
        assert_eq!(days_remaining(not_after, now()), 4);
        assert_eq!(
            classify(&o, now(), &Thresholds::default()),
            SslStatus::Critical
        );
    }

    #[test]
    fn test_classify_expired() {
        let not_after = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        let o = obs(Some(not_after));
        assert_eq!(days_remaining(not_after, now()), -1);
        assert_eq!(
            classify(&o, now(), &Thresholds::default()),
            SslStatus::Expired
        );
    }

    #[test]
    fn test_expired_decided_before_day_arithmetic() {
        // Lapsed one hour ago: ceil would give 0, but the raw instant
        // comparison already says Expired.
        let not_after = now() - Duration::hours(1);
        let o = obs(Some(not_after));
        assert_eq!(
            classify(&o, now(), &Thresholds::default()),
            SslStatus::Expired
        );
    }

    #[test]
    fn test_classify_threshold_edges() {
        let th = Thresholds::default();
        // Exactly 7 days is Warning, not Critical.
        let o = obs(Some(now() + Duration::days(7)));
        assert_eq!(classify(&o, now(), &th), SslStatus::Warning);
        // Exactly 30 days is Valid.
        let o = obs(Some(now() + Duration::days(30)));
        assert_eq!(classify(&o, now(), &th), SslStatus::Valid);
    }

    #[test]
    fn test_classify_offline_when_unreachable() {
        let o = obs(None);
        assert_eq!(
            classify(&o, now(), &Thresholds::default()),
            SslStatus::Offline
        );
    }

    #[test]
    fn test_entering_critical_emits_once() {
        let th = Thresholds::default();
        let not_after = Utc.with_ymd_and_hms(2025, 1, 4, 6, 0, 0).unwrap();
        let o = obs(Some(not_after));

        // Valid -> Critical emits.
        let prior = record(SslStatus::Valid, true, None);
        let (_, events) = apply_tls(Some(&prior), &o, &WhoisInfo::default(), now(), &th);
        assert_eq!(events, vec![EventKind::SslCritical]);

        // Critical -> Critical one hour after notifying does not.
        let prior = record(
            SslStatus::Critical,
            true,
            Some(now() - Duration::hours(1)),
        );
        let later = now() + Duration::hours(1);
        let (_, events) = apply_tls(Some(&prior), &o, &WhoisInfo::default(), later, &th);
        assert!(events.is_empty());

        // Critical -> Critical after the 24h window re-emits.
        let prior = record(
            SslStatus::Critical,
            true,
            Some(now() - Duration::hours(25)),
        );
        let (_, events) = apply_tls(Some(&prior), &o, &WhoisInfo::default(), now(), &th);
        assert_eq!(events, vec![EventKind::SslCritical]);
    }

    #[test]
    fn test_warning_emits_only_on_entry_from_below() {
        let th = Thresholds::default();
        let not_after = Utc.with_ymd_and_hms(2025, 1, 20, 12, 0, 0).unwrap();
        let o = obs(Some(not_after));

        let prior = record(SslStatus::Valid, true, None);
        let (_, events) = apply_tls(Some(&prior), &o, &WhoisInfo::default(), now(), &th);
        assert_eq!(events, vec![EventKind::SslWarning]);

        // Warning -> Warning stays quiet.
        let prior = record(SslStatus::Warning, true, None);
        let (_, events) = apply_tls(Some(&prior), &o, &WhoisInfo::default(), now(), &th);
        assert!(events.is_empty());

        // Critical -> Warning (renewed partway) is not a fresh warning.
        let prior = record(SslStatus::Critical, true, None);
        let (_, events) = apply_tls(Some(&prior), &o, &WhoisInfo::default(), now(), &th);
        assert!(events.is_empty());
    }

    #[test]
    fn test_new_domain_entering_critical_emits() {
        let th = Thresholds::default();
        let not_after = Utc.with_ymd_and_hms(2025, 1, 4, 6, 0, 0).unwrap();
        let (patch, events) = apply_tls(None, &obs(Some(not_after)), &WhoisInfo::default(), now(), &th);
        assert_eq!(patch.ssl_status, Some(SslStatus::Critical));
        assert_eq!(events, vec![EventKind::SslCritical]);
    }

    #[test]
    fn test_failed_probe_nulls_tls_fields() {
        let th = Thresholds::default();
        let o = TlsObservation::unreachable("example.com", zenstack_common::types::ProbeErrorKind::Timeout);
        let (patch, events) = apply_tls(None, &o, &WhoisInfo::default(), now(), &th);
        assert_eq!(patch.ssl_expiry, Some(None));
        assert_eq!(patch.issuer_org, Some(None));
        assert_eq!(patch.ssl_status, Some(SslStatus::Offline));
        assert!(events.is_empty());
    }

    #[test]
    fn test_empty_whois_does_not_clobber() {
        let th = Thresholds::default();
        let not_after = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let (patch, _) = apply_tls(None, &obs(Some(not_after)), &WhoisInfo::default(), now(), &th);
        assert!(patch.registrar.is_none());
        assert!(patch.domain_expiry.is_none());
        assert!(patch.name_servers.is_none());
    }

    #[test]
    fn test_site_down_transition() {
        let o = HttpObservation {
            domain: "example.com".to_string(),
            is_live: false,
            status_code: 0,
            response_time_ms: 5000,
        };
        let prior = record(SslStatus::Valid, true, None);
        let (patch, events) = apply_http(Some(&prior), &o);
        assert_eq!(patch.is_live, Some(false));
        assert_eq!(patch.last_status_code, Some(0));
        assert_eq!(events, vec![EventKind::SiteDown]);

        // Down -> down stays quiet.
        let prior = record(SslStatus::Valid, false, None);
        let (_, events) = apply_http(Some(&prior), &o);
        assert!(events.is_empty());
    }

    #[test]
    fn test_site_recovered_transition() {
        let o = HttpObservation {
            domain: "example.com".to_string(),
            is_live: true,
            status_code: 200,
            response_time_ms: 80,
        };
        let prior = record(SslStatus::Valid, false, None);
        let (_, events) = apply_http(Some(&prior), &o);
        assert_eq!(events, vec![EventKind::SiteRecovered]);
    }

    #[test]
    fn test_http_patch_touches_no_tls_fields() {
        let o = HttpObservation {
            domain: "example.com".to_string(),
            is_live: true,
            status_code: 200,
            response_time_ms: 80,
        };
        let (patch, _) = apply_http(None, &o);
        assert!(patch.ssl_expiry.is_none());
        assert!(patch.ssl_status.is_none());
        assert!(patch.issuer_org.is_none());
        assert!(patch.registrar.is_none());
        assert!(patch.last_check_at.is_none());
    }
}
