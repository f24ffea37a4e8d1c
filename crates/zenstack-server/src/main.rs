use anyhow::Result;
use chrono::Utc;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;
use zenstack_notify::{Notifier, NotifierConfig};
use zenstack_probe::HttpProber;
use zenstack_storage::Store;

use zenstack_server::app;
use zenstack_server::config::ServerConfig;
use zenstack_server::monitor::{ScanScheduler, Scanner, Thresholds};
use zenstack_server::seed;
use zenstack_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install default CryptoProvider: {e:?}"))?;

    zenstack_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("zenstack=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/server.toml".to_string());
    let config = ServerConfig::load(&config_path)?;

    tracing::info!(
        http_port = config.http_port,
        data_dir = %config.data_dir,
        tls_sweep_secs = config.scan.tls_sweep_interval_secs,
        http_sweep_secs = config.scan.http_sweep_interval_secs,
        workers = config.scan.workers,
        "zenstack-server starting"
    );

    // Failing to open the store is fatal: exit non-zero.
    let store = Arc::new(Store::new(Path::new(&config.data_dir)).await?);

    seed::seed_admin(&store, &config.auth).await?;
    if let Err(e) = seed::seed_templates(&store).await {
        tracing::error!(error = %e, "Failed to seed default message templates");
    }

    let notifier = Arc::new(Notifier::new(
        store.clone(),
        NotifierConfig {
            webhook_timeout: Duration::from_secs(config.notifications.webhook_timeout_secs),
            telegram_timeout: Duration::from_secs(config.notifications.telegram_timeout_secs),
            renotify_window: chrono::Duration::hours(config.notifications.renotify_window_hours),
            notify_on_recovery: config.notifications.notify_on_recovery,
        },
    ));

    let scanner = Arc::new(Scanner::new(
        config.scan.workers,
        Duration::from_secs(config.scan.tls_timeout_secs),
        Duration::from_secs(config.scan.whois_timeout_secs),
    ));
    let http_prober = HttpProber::new();

    let thresholds = Thresholds {
        critical_days: config.scan.critical_threshold_days,
        warning_days: config.scan.warning_threshold_days,
        renotify_window: chrono::Duration::hours(config.notifications.renotify_window_hours),
    };

    let state = AppState {
        store: store.clone(),
        notifier: notifier.clone(),
        scanner: scanner.clone(),
        http_prober: http_prober.clone(),
        jwt_secret: Arc::new(config.auth.jwt_secret.clone()),
        token_expire_secs: config.auth.token_expire_secs,
        start_time: Utc::now(),
        config: Arc::new(config.clone()),
    };

    // Sweep schedulers: both fire immediately, then on their own cadence.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = Arc::new(ScanScheduler::new(
        store.clone(),
        notifier.clone(),
        scanner.clone(),
        http_prober.clone(),
        thresholds,
        Duration::from_secs(config.scan.tls_sweep_interval_secs),
        Duration::from_secs(config.scan.http_sweep_interval_secs),
        Duration::from_secs(config.scan.http_timeout_secs),
        config.scan.workers,
    ));
    let tls_handle = tokio::spawn(scheduler.clone().run_tls_loop(shutdown_rx.clone()));
    let http_handle = tokio::spawn(scheduler.clone().run_http_loop(shutdown_rx));

    // Failing to bind the listener is fatal: exit non-zero.
    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(http = %addr, "Server started");

    let app = app::build_http_app(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
        })
        .await?;

    // Bounded grace period for in-flight sweeps, then abort.
    tracing::info!("Shutting down gracefully");
    let _ = shutdown_tx.send(true);
    let drain = async {
        let _ = tls_handle.await;
        let _ = http_handle.await;
    };
    if tokio::time::timeout(Duration::from_secs(10), drain).await.is_err() {
        tracing::warn!("Sweep tasks did not stop within the grace period");
    }
    tracing::info!("Server stopped");

    Ok(())
}
