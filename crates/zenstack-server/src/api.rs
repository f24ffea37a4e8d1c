pub mod dashboard;
pub mod domains;
pub mod notifications;
pub mod scan;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::state::AppState;

/// Error body used by every endpoint: `{error, details?}`.
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub fn error_response(status: StatusCode, msg: &str) -> Response {
    (
        status,
        Json(ApiError {
            error: msg.to_string(),
            details: None,
        }),
    )
        .into_response()
}

pub fn error_response_with_details(status: StatusCode, msg: &str, details: &str) -> Response {
    (
        status,
        Json(ApiError {
            error: msg.to_string(),
            details: Some(details.to_string()),
        }),
    )
        .into_response()
}

/// Maps a storage failure onto the HTTP contract: conflicts are 409,
/// everything else is a 500.
pub fn storage_error_response(err: zenstack_storage::StorageError) -> Response {
    use zenstack_storage::StorageError;
    match err {
        StorageError::Conflict { .. } => error_response(StatusCode::CONFLICT, "conflict"),
        other => {
            tracing::error!(error = %other, "Storage operation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

#[derive(Serialize, ToSchema)]
struct HealthResponse {
    version: String,
    uptime_secs: i64,
}

/// 获取服务健康状态。
#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "服务健康状态", body = HealthResponse)
    )
)]
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    (
        StatusCode::OK,
        Json(HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
        }),
    )
}

pub fn public_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(health))
}

pub fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(crate::auth::login))
}

pub fn protected_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(scan::scan_domains))
        .routes(routes!(domains::list_domains))
        .routes(routes!(domains::update_auto_renew))
        .routes(routes!(domains::delete_domain))
        .routes(routes!(dashboard::dashboard_stats))
}

pub fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            notifications::list_configs,
            notifications::create_config
        ))
        .routes(routes!(
            notifications::update_config,
            notifications::delete_config
        ))
        .routes(routes!(
            notifications::list_templates,
            notifications::create_template
        ))
        .routes(routes!(
            notifications::update_template,
            notifications::delete_template
        ))
        .routes(routes!(
            notifications::list_telegram_configs,
            notifications::create_telegram_config
        ))
        .routes(routes!(
            notifications::update_telegram_config,
            notifications::delete_telegram_config
        ))
        .routes(routes!(notifications::test_telegram_config))
}
