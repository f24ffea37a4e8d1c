use crate::config::ServerConfig;
use crate::monitor::Scanner;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use zenstack_notify::Notifier;
use zenstack_probe::HttpProber;
use zenstack_storage::Store;

/// Shared handles for HTTP handlers and the schedulers. Everything is
/// behind an `Arc`, so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub notifier: Arc<Notifier>,
    pub scanner: Arc<Scanner>,
    pub http_prober: HttpProber,
    pub jwt_secret: Arc<String>,
    pub token_expire_secs: u64,
    pub start_time: DateTime<Utc>,
    pub config: Arc<ServerConfig>,
}
