use serde::Deserialize;

/// Server configuration, loaded from an optional TOML file and then
/// overridden by environment variables. Read-only after boot.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub notifications: NotificationPolicyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. `ZENSTACK_JWT_SECRET` overrides; the dev
    /// default is acceptable outside production only.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_expire_secs")]
    pub token_expire_secs: u64,
    #[serde(default = "default_admin_username")]
    pub default_username: String,
    #[serde(default = "default_admin_password")]
    pub default_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_tls_sweep_interval_secs")]
    pub tls_sweep_interval_secs: u64,
    #[serde(default = "default_http_sweep_interval_secs")]
    pub http_sweep_interval_secs: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_critical_threshold_days")]
    pub critical_threshold_days: i64,
    #[serde(default = "default_warning_threshold_days")]
    pub warning_threshold_days: i64,
    #[serde(default = "default_tls_timeout_secs")]
    pub tls_timeout_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_whois_timeout_secs")]
    pub whois_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPolicyConfig {
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
    #[serde(default = "default_telegram_timeout_secs")]
    pub telegram_timeout_secs: u64,
    #[serde(default = "default_renotify_window_hours")]
    pub renotify_window_hours: i64,
    /// SITE_RECOVERED events are emitted regardless; this decides whether
    /// they notify.
    #[serde(default)]
    pub notify_on_recovery: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_expire_secs: default_token_expire_secs(),
            default_username: default_admin_username(),
            default_password: default_admin_password(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tls_sweep_interval_secs: default_tls_sweep_interval_secs(),
            http_sweep_interval_secs: default_http_sweep_interval_secs(),
            workers: default_workers(),
            critical_threshold_days: default_critical_threshold_days(),
            warning_threshold_days: default_warning_threshold_days(),
            tls_timeout_secs: default_tls_timeout_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            whois_timeout_secs: default_whois_timeout_secs(),
        }
    }
}

impl Default for NotificationPolicyConfig {
    fn default() -> Self {
        Self {
            webhook_timeout_secs: default_webhook_timeout_secs(),
            telegram_timeout_secs: default_telegram_timeout_secs(),
            renotify_window_hours: default_renotify_window_hours(),
            notify_on_recovery: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            data_dir: default_data_dir(),
            auth: AuthConfig::default(),
            scan: ScanConfig::default(),
            notifications: NotificationPolicyConfig::default(),
        }
    }
}

fn default_http_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_jwt_secret() -> String {
    "zenstack-dev-secret".to_string()
}

fn default_token_expire_secs() -> u64 {
    86_400
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin123".to_string()
}

fn default_tls_sweep_interval_secs() -> u64 {
    21_600
}

fn default_http_sweep_interval_secs() -> u64 {
    120
}

fn default_workers() -> usize {
    5
}

fn default_critical_threshold_days() -> i64 {
    7
}

fn default_warning_threshold_days() -> i64 {
    30
}

fn default_tls_timeout_secs() -> u64 {
    5
}

fn default_http_timeout_secs() -> u64 {
    5
}

fn default_whois_timeout_secs() -> u64 {
    10
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

fn default_telegram_timeout_secs() -> u64 {
    15
}

fn default_renotify_window_hours() -> i64 {
    24
}

impl ServerConfig {
    /// Load the TOML file when present, then apply env overrides. A
    /// missing file is not an error: defaults plus env are a complete
    /// configuration.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config: Self = match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(secret) = std::env::var("ZENSTACK_JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = secret;
            }
        }
        if let Some(port) = env_parse("ZENSTACK_HTTP_PORT") {
            self.http_port = port;
        }
        if let Ok(dir) = std::env::var("ZENSTACK_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = dir;
            }
        }
        if let Some(secs) = env_parse("ZENSTACK_TLS_SWEEP_SECS") {
            self.scan.tls_sweep_interval_secs = secs;
        }
        if let Some(secs) = env_parse("ZENSTACK_HTTP_SWEEP_SECS") {
            self.scan.http_sweep_interval_secs = secs;
        }
        if let Some(workers) = env_parse("ZENSTACK_SCAN_WORKERS") {
            self.scan.workers = workers;
        }
        if let Some(days) = env_parse("ZENSTACK_CRITICAL_THRESHOLD_DAYS") {
            self.scan.critical_threshold_days = days;
        }
        if let Some(days) = env_parse("ZENSTACK_WARNING_THRESHOLD_DAYS") {
            self.scan.warning_threshold_days = days;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_contract() {
        let config = ServerConfig::default();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.scan.tls_sweep_interval_secs, 21_600);
        assert_eq!(config.scan.http_sweep_interval_secs, 120);
        assert_eq!(config.scan.workers, 5);
        assert_eq!(config.scan.critical_threshold_days, 7);
        assert_eq!(config.scan.warning_threshold_days, 30);
        assert_eq!(config.scan.tls_timeout_secs, 5);
        assert_eq!(config.scan.http_timeout_secs, 5);
        assert_eq!(config.scan.whois_timeout_secs, 10);
        assert_eq!(config.notifications.webhook_timeout_secs, 10);
        assert_eq!(config.notifications.telegram_timeout_secs, 15);
        assert_eq!(config.notifications.renotify_window_hours, 24);
        assert!(!config.notifications.notify_on_recovery);
        assert_eq!(config.auth.token_expire_secs, 86_400);
        assert_eq!(config.auth.jwt_secret, "zenstack-dev-secret");
    }

    #[test]
    fn test_partial_toml_keeps_defaults_elsewhere() {
        let config: ServerConfig = toml::from_str(
            "
http_port = 9999

[scan]
workers = 12
",
        )
        .unwrap();
        assert_eq!(config.http_port, 9999);
        assert_eq!(config.scan.workers, 12);
        assert_eq!(config.scan.critical_threshold_days, 7);
        assert_eq!(config.notifications.renotify_window_hours, 24);
    }
}
