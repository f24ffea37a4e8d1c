use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use zenstack_common::types::WhoisInfo;

const IANA_WHOIS: &str = "whois.iana.org";

/// Registrable apex of a fully qualified name per the public-suffix
/// list: `api.internal.example.co.uk` -> `example.co.uk`.
pub fn registrable_apex(domain: &str) -> String {
    let lowered = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    psl::domain_str(&lowered)
        .map(|apex| apex.to_string())
        .unwrap_or(lowered)
}

/// Look up registrar, expiration date, and authoritative nameservers for
/// the apex of `domain`.
///
/// WHOIS goes through the IANA referral server for the TLD; when the
/// record carries no nameservers, an authoritative DNS `NS` lookup on the
/// apex fills them in. Any failure yields an empty struct.
pub async fn resolve(domain: &str, timeout: Duration) -> WhoisInfo {
    let apex = registrable_apex(domain);
    if apex.is_empty() {
        return WhoisInfo::default();
    }

    let raw = match whois_lookup(&apex, timeout).await {
        Some(raw) => raw,
        None => {
            tracing::debug!(apex = %apex, "WHOIS lookup failed");
            // Registration data is gone, but the NS fallback may still work.
            let nameservers = ns_fallback(&apex, timeout).await;
            return WhoisInfo {
                nameservers,
                ..WhoisInfo::default()
            };
        }
    };

    let registrar = parse_registrar(&raw);
    let expires_at = parse_expiration(&raw);

    let mut nameservers = parse_nameservers(&raw);
    if nameservers.is_empty() {
        nameservers = ns_fallback(&apex, timeout).await;
    }

    WhoisInfo {
        registrar,
        expires_at,
        nameservers,
    }
}

/// Query IANA for the TLD's registry WHOIS server, then query that
/// server for the apex. Falls back to the IANA response itself when no
/// referral is present.
async fn whois_lookup(apex: &str, timeout: Duration) -> Option<String> {
    let iana = query_server(IANA_WHOIS, apex, timeout).await?;
    let referral = find_field(&iana, &["refer:", "whois:"]);
    match referral {
        Some(server) if server != IANA_WHOIS => {
            match query_server(&server, apex, timeout).await {
                Some(raw) => Some(raw),
                None => Some(iana),
            }
        }
        _ => Some(iana),
    }
}

/// One raw WHOIS exchange over TCP port 43.
async fn query_server(server: &str, query: &str, timeout: Duration) -> Option<String> {
    let exchange = async {
        let mut stream = TcpStream::connect((server, 43)).await.ok()?;
        stream
            .write_all(format!("{query}\r\n").as_bytes())
            .await
            .ok()?;
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.ok()?;
        Some(String::from_utf8_lossy(&buf).into_owned())
    };
    tokio::time::timeout(timeout, exchange).await.ok().flatten()
}

/// First value for any of `keys` (case-insensitive line-prefix match).
fn find_field(raw: &str, keys: &[&str]) -> Option<String> {
    for line in raw.lines() {
        let trimmed = line.trim();
        let lowered = trimmed.to_ascii_lowercase();
        for key in keys {
            if let Some(rest) = lowered.strip_prefix(key) {
                let value = trimmed[trimmed.len() - rest.len()..].trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

fn parse_registrar(raw: &str) -> Option<String> {
    find_field(raw, &["registrar:", "registrar name:", "sponsoring registrar:"])
}

fn parse_expiration(raw: &str) -> Option<DateTime<Utc>> {
    let value = find_field(
        raw,
        &[
            "registry expiry date:",
            "registrar registration expiration date:",
            "expiry date:",
            "expiration date:",
            "expiration time:",
            "expire:",
            "expires:",
            "paid-till:",
        ],
    )?;
    parse_expiration_date(&value)
}

/// Expiration-date parse ladder. The first layout that parses wins; an
/// unparseable string yields `None` rather than an error.
fn parse_expiration_date(value: &str) -> Option<DateTime<Utc>> {
    let s = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ") {
        return Some(naive.and_utc());
    }
    // "2025-06-01 00:00:00 UTC" style: strip the trailing zone
    // abbreviation and read the timestamp as UTC.
    if let Some((head, tail)) = s.rsplit_once(' ') {
        if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphabetic()) {
            if let Ok(naive) = NaiveDateTime::parse_from_str(head, "%Y-%m-%d %H:%M:%S") {
                return Some(naive.and_utc());
            }
        }
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Nameserver lines, whitespace-trimmed, trailing dot stripped,
/// deduplicated preserving first occurrence. `nserver:` lines may carry
/// glue addresses after the host; only the host is kept.
fn parse_nameservers(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let rest = ["name server:", "nserver:"]
            .iter()
            .find_map(|key| lowered.strip_prefix(key));
        let Some(rest) = rest else { continue };
        // Re-slice the original line so host case is preserved.
        let value = &trimmed[trimmed.len() - rest.len()..];
        let host = value
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim()
            .trim_end_matches('.')
            .to_string();
        if host.is_empty() {
            continue;
        }
        if seen.insert(host.clone()) {
            result.push(host);
        }
    }
    result
}

/// Authoritative NS lookup for the apex, used when WHOIS lists none.
async fn ns_fallback(apex: &str, timeout: Duration) -> Vec<String> {
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    let lookup = tokio::time::timeout(timeout, resolver.ns_lookup(apex)).await;
    match lookup {
        Ok(Ok(records)) => {
            let mut seen = std::collections::HashSet::new();
            let mut result = Vec::new();
            for ns in records.iter() {
                let host = ns.to_string().trim().trim_end_matches('.').to_string();
                if !host.is_empty() && seen.insert(host.clone()) {
                    result.push(host);
                }
            }
            result
        }
        Ok(Err(e)) => {
            tracing::debug!(apex = %apex, error = %e, "DNS NS fallback failed");
            Vec::new()
        }
        Err(_) => {
            tracing::debug!(apex = %apex, "DNS NS fallback timed out");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_apex_of_multi_label_public_suffix() {
        assert_eq!(
            registrable_apex("api.internal.example.co.uk"),
            "example.co.uk"
        );
        assert_eq!(registrable_apex("www.example.com"), "example.com");
        assert_eq!(registrable_apex("example.com"), "example.com");
        assert_eq!(registrable_apex("Example.COM."), "example.com");
    }

    #[test]
    fn test_expiration_parse_ladder() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 15, 4, 30, 0).unwrap();
        for s in [
            "2026-03-15T04:30:00+00:00",
            "2026-03-15T04:30:00Z",
            "2026-03-15 04:30:00 UTC",
            "2026-03-15 04:30:00",
        ] {
            assert_eq!(parse_expiration_date(s), Some(expected), "layout: {s}");
        }
        assert_eq!(
            parse_expiration_date("2026-03-15"),
            Some(Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_expiration_date("15 Mar 2026"), None);
        assert_eq!(parse_expiration_date(""), None);
    }

    #[test]
    fn test_registrar_line_match_is_case_insensitive() {
        let raw = "Domain Name: EXAMPLE.COM\n   Registrar: MarkMonitor Inc.\n";
        assert_eq!(parse_registrar(raw).as_deref(), Some("MarkMonitor Inc."));
        let raw = "REGISTRAR: GoDaddy.com, LLC\n";
        assert_eq!(parse_registrar(raw).as_deref(), Some("GoDaddy.com, LLC"));
    }

    #[test]
    fn test_nameserver_cleanup_and_dedup() {
        let raw = "\
Name Server: NS1.EXAMPLE.NET.
Name Server: ns2.example.net
Name Server: NS1.EXAMPLE.NET.
nserver: ns3.example.net 192.0.2.53
";
        let servers = parse_nameservers(raw);
        assert_eq!(
            servers,
            vec!["NS1.EXAMPLE.NET", "ns2.example.net", "ns3.example.net"]
        );
    }

    #[test]
    fn test_referral_field() {
        let raw = "% IANA WHOIS server\nrefer:        whois.verisign-grs.com\ndomain:       COM\n";
        assert_eq!(
            find_field(raw, &["refer:"]).as_deref(),
            Some("whois.verisign-grs.com")
        );
    }
}
