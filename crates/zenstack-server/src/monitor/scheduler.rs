use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use zenstack_common::types::TransitionEvent;
use zenstack_notify::Notifier;
use zenstack_probe::HttpProber;
use zenstack_storage::{DomainFilter, Store};

use super::engine::{self, Thresholds};
use super::{pool, Scanner};

/// Re-entry guard for one sweep kind. A tick that fires while the
/// previous sweep of the same kind is still running is dropped, never
/// queued.
#[derive(Default)]
pub struct SweepGate {
    running: AtomicBool,
}

impl SweepGate {
    /// Try to start a sweep. Returns false when one is already running.
    pub fn try_enter(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn leave(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Drives the two periodic sweeps. Both fire immediately on boot and
/// then on their own cadence; observations stream serially into the
/// state engine, which keeps per-name updates ordered within a sweep.
pub struct ScanScheduler {
    store: Arc<Store>,
    notifier: Arc<Notifier>,
    scanner: Arc<Scanner>,
    http_prober: HttpProber,
    thresholds: Thresholds,
    tls_period: Duration,
    http_period: Duration,
    http_timeout: Duration,
    workers: usize,
    tls_gate: SweepGate,
    http_gate: SweepGate,
}

impl ScanScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<Store>,
        notifier: Arc<Notifier>,
        scanner: Arc<Scanner>,
        http_prober: HttpProber,
        thresholds: Thresholds,
        tls_period: Duration,
        http_period: Duration,
        http_timeout: Duration,
        workers: usize,
    ) -> Self {
        Self {
            store,
            notifier,
            scanner,
            http_prober,
            thresholds,
            tls_period,
            http_period,
            http_timeout,
            workers,
            tls_gate: SweepGate::default(),
            http_gate: SweepGate::default(),
        }
    }

    /// TLS/WHOIS sweep loop. Runs until the shutdown signal flips.
    pub async fn run_tls_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            period_secs = self.tls_period.as_secs(),
            workers = self.workers,
            "TLS/WHOIS sweep scheduler started"
        );
        let mut tick = interval(self.tls_period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if !self.tls_gate.try_enter() {
                        tracing::warn!("TLS sweep still running, dropping tick");
                        continue;
                    }
                    self.tls_sweep().await;
                    self.tls_gate.leave();
                }
                _ = shutdown.changed() => {
                    tracing::info!("TLS sweep scheduler stopping");
                    break;
                }
            }
        }
    }

    /// HTTP liveness sweep loop.
    pub async fn run_http_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            period_secs = self.http_period.as_secs(),
            workers = self.workers,
            "HTTP liveness sweep scheduler started"
        );
        let mut tick = interval(self.http_period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if !self.http_gate.try_enter() {
                        tracing::warn!("HTTP sweep still running, dropping tick");
                        continue;
                    }
                    self.http_sweep().await;
                    self.http_gate.leave();
                }
                _ = shutdown.changed() => {
                    tracing::info!("HTTP sweep scheduler stopping");
                    break;
                }
            }
        }
    }

    /// Per-probe deadline: the configured timeout, capped at a tenth of
    /// the sweep period so a slow tail cannot eat the whole window.
    fn probe_deadline(configured: Duration, period: Duration) -> Duration {
        configured.min(period / 10).max(Duration::from_millis(100))
    }

    async fn tls_sweep(&self) {
        let domains = match self.store.list_domains(&DomainFilter::default()).await {
            Ok(domains) => domains,
            Err(e) => {
                // Snapshot failure skips this tick; the next one retries.
                tracing::error!(error = %e, "TLS sweep skipped, could not snapshot domains");
                return;
            }
        };
        if domains.is_empty() {
            return;
        }

        tracing::info!(count = domains.len(), "TLS/WHOIS sweep started");
        let deadline = Self::probe_deadline(self.scanner.tls_timeout, self.tls_period);
        let whois_deadline = Self::probe_deadline(self.scanner.whois_timeout, self.tls_period);
        let scanner = Arc::new(Scanner::new(self.workers, deadline, whois_deadline));

        let sc = scanner.clone();
        let mut rx = pool::spawn_workers(
            domains,
            self.workers,
            move |domain: zenstack_common::types::MonitoredDomain| {
                let sc = sc.clone();
                async move {
                    let outcome = sc.scan_one(&domain.domain_name).await;
                    (domain, outcome)
                }
            },
        );

        let mut updated = 0usize;
        while let Some((prior, outcome)) = rx.recv().await {
            let now = chrono::Utc::now();
            let (patch, events) = engine::apply_tls(
                Some(&prior),
                &outcome.tls,
                &outcome.whois,
                now,
                &self.thresholds,
            );
            // The write comes first; a failed write suppresses the events.
            match self.store.upsert_domain(&prior.domain_name, &patch).await {
                Ok(stored) => {
                    updated += 1;
                    for kind in events {
                        let event = TransitionEvent {
                            kind,
                            domain: stored.clone(),
                        };
                        self.notifier.dispatch(&event).await;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        domain = %prior.domain_name,
                        error = %e,
                        "TLS sweep upsert failed, events suppressed"
                    );
                }
            }
        }
        tracing::info!(updated, "TLS/WHOIS sweep finished");
    }

    async fn http_sweep(&self) {
        let domains = match self.store.list_domains(&DomainFilter::default()).await {
            Ok(domains) => domains,
            Err(e) => {
                tracing::error!(error = %e, "HTTP sweep skipped, could not snapshot domains");
                return;
            }
        };
        if domains.is_empty() {
            return;
        }

        tracing::debug!(count = domains.len(), "HTTP liveness sweep started");
        let deadline = Self::probe_deadline(self.http_timeout, self.http_period);

        let prober = self.http_prober.clone();
        let mut rx = pool::spawn_workers(
            domains,
            self.workers,
            move |domain: zenstack_common::types::MonitoredDomain| {
                let prober = prober.clone();
                async move {
                    let obs = prober.probe(&domain.domain_name, deadline).await;
                    (domain, obs)
                }
            },
        );

        let mut updated = 0usize;
        while let Some((prior, obs)) = rx.recv().await {
            let (patch, events) = engine::apply_http(Some(&prior), &obs);
            match self.store.upsert_domain(&prior.domain_name, &patch).await {
                Ok(stored) => {
                    updated += 1;
                    for kind in events {
                        let event = TransitionEvent {
                            kind,
                            domain: stored.clone(),
                        };
                        self.notifier.dispatch(&event).await;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        domain = %prior.domain_name,
                        error = %e,
                        "HTTP sweep upsert failed, events suppressed"
                    );
                }
            }
        }
        tracing::debug!(updated, "HTTP liveness sweep finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_gate_drops_overlapping_entry() {
        let gate = SweepGate::default();
        assert!(gate.try_enter());
        // The next tick arriving mid-sweep is refused.
        assert!(!gate.try_enter());
        assert!(gate.is_running());
        gate.leave();
        assert!(gate.try_enter());
        gate.leave();
    }

    #[test]
    fn test_probe_deadline_caps_at_tenth_of_period() {
        let d = ScanScheduler::probe_deadline(
            Duration::from_secs(5),
            Duration::from_secs(120),
        );
        assert_eq!(d, Duration::from_secs(5));

        let d = ScanScheduler::probe_deadline(
            Duration::from_secs(5),
            Duration::from_secs(20),
        );
        assert_eq!(d, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_gate_under_concurrent_contention() {
        let gate = Arc::new(SweepGate::default());
        let mut entered = 0;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = gate.clone();
            handles.push(tokio::spawn(async move { gate.try_enter() }));
        }
        for h in handles {
            if h.await.unwrap() {
                entered += 1;
            }
        }
        // Exactly one task can observe the sweep as its own.
        assert_eq!(entered, 1);
    }
}
