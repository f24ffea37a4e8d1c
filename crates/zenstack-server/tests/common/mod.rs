#![allow(dead_code)]

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::Value;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt;
use zenstack_notify::{Notifier, NotifierConfig};
use zenstack_probe::HttpProber;
use zenstack_server::app;
use zenstack_server::config::ServerConfig;
use zenstack_server::monitor::Scanner;
use zenstack_server::state::AppState;
use zenstack_storage::Store;

pub const TEST_PASSWORD: &str = "changeme";

pub struct TestContext {
    pub temp_dir: TempDir,
    pub state: AppState,
    pub app: axum::Router,
}

fn ensure_rustls_provider() {
    static RUSTLS_PROVIDER_INIT: OnceLock<()> = OnceLock::new();
    RUSTLS_PROVIDER_INIT.get_or_init(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

pub async fn build_test_context() -> Result<TestContext> {
    zenstack_common::id::init(1, 1);
    ensure_rustls_provider();

    let temp_dir = tempfile::tempdir()?;
    let store = Arc::new(Store::new(temp_dir.path()).await?);

    let password_hash = bcrypt::hash(TEST_PASSWORD, 4)?;
    store
        .create_user("admin", &password_hash, "admin", "active")
        .await?;
    store
        .create_user("viewer", &password_hash, "viewer", "active")
        .await?;
    store
        .create_user("applicant", &password_hash, "viewer", "pending")
        .await?;
    store
        .create_user("blocked", &password_hash, "viewer", "disabled")
        .await?;

    let notifier = Arc::new(Notifier::new(store.clone(), NotifierConfig::default()));
    let scanner = Arc::new(Scanner::new(
        2,
        Duration::from_millis(200),
        Duration::from_millis(200),
    ));

    let config = ServerConfig::default();
    let state = AppState {
        store: store.clone(),
        notifier,
        scanner,
        http_prober: HttpProber::new(),
        jwt_secret: Arc::new("test-secret".to_string()),
        token_expire_secs: 3600,
        start_time: Utc::now(),
        config: Arc::new(config),
    };

    let app = app::build_http_app(state.clone());
    Ok(TestContext {
        temp_dir,
        state,
        app,
    })
}

pub async fn send_request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should not fail at the transport level");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_default();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Log in and return the bearer token.
pub async fn login(app: &axum::Router, username: &str, password: &str) -> String {
    let (status, body) = send_request(
        app,
        "POST",
        "/v1/auth/login",
        None,
        Some(serde_json::json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().expect("token in response").to_string()
}
