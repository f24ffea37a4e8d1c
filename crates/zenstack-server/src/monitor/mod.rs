//! Scan orchestration: the bounded worker pool, the per-domain state
//! engine, and the two periodic sweep loops.

pub mod engine;
pub mod pool;
pub mod scheduler;

pub use engine::Thresholds;
pub use scheduler::ScanScheduler;

use std::time::Duration;
use zenstack_common::types::{TlsObservation, WhoisInfo};

/// One ad-hoc scan result: the TLS observation plus the WHOIS data for
/// the name's registrable apex.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub domain_name: String,
    pub tls: TlsObservation,
    pub whois: WhoisInfo,
}

/// TLS/WHOIS scan primitive shared by the ad-hoc path and the TLS sweep.
pub struct Scanner {
    pub workers: usize,
    pub tls_timeout: Duration,
    pub whois_timeout: Duration,
}

impl Scanner {
    pub fn new(workers: usize, tls_timeout: Duration, whois_timeout: Duration) -> Self {
        Self {
            workers,
            tls_timeout,
            whois_timeout,
        }
    }

    /// Probe every name once through the worker pool and collect the
    /// results. Runs synchronously with respect to the caller; dropping
    /// the future cancels in-flight probes through their deadlines.
    pub async fn scan(&self, names: Vec<String>) -> Vec<ScanOutcome> {
        let tls_timeout = self.tls_timeout;
        let whois_timeout = self.whois_timeout;
        let mut rx = pool::spawn_workers(names, self.workers, move |name: String| async move {
            scan_name(&name, tls_timeout, whois_timeout).await
        });

        let mut outcomes = Vec::new();
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    pub async fn scan_one(&self, name: &str) -> ScanOutcome {
        scan_name(name, self.tls_timeout, self.whois_timeout).await
    }
}

async fn scan_name(name: &str, tls_timeout: Duration, whois_timeout: Duration) -> ScanOutcome {
    let tls = zenstack_probe::tls::probe_tls(name, tls_timeout).await;
    // WHOIS is only worth the round trip when the name resolved at all.
    let whois = if tls.reachable {
        zenstack_probe::whois::resolve(name, whois_timeout).await
    } else {
        WhoisInfo::default()
    };
    ScanOutcome {
        domain_name: name.to_string(),
        tls,
        whois,
    }
}
