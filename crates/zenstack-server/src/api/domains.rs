use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zenstack_common::types::{days_remaining, DomainPatch, MonitoredDomain};

use crate::api::{error_response, storage_error_response, ApiError};
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct DomainResponse {
    pub id: String,
    pub domain_name: String,
    pub ssl_expiry: Option<DateTime<Utc>>,
    pub ssl_status: String,
    pub days_remaining: Option<i64>,
    pub issuer_org: Option<String>,
    pub registrar: Option<String>,
    pub domain_expiry: Option<DateTime<Utc>>,
    pub name_servers: Vec<String>,
    pub is_live: bool,
    pub last_status_code: i32,
    pub response_time_ms: i32,
    pub auto_renew: bool,
    pub last_check_at: Option<DateTime<Utc>>,
    pub last_notification_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MonitoredDomain> for DomainResponse {
    fn from(d: MonitoredDomain) -> Self {
        let now = Utc::now();
        Self {
            days_remaining: d.ssl_expiry.map(|e| days_remaining(e, now)),
            id: d.id,
            domain_name: d.domain_name,
            ssl_expiry: d.ssl_expiry,
            ssl_status: d.ssl_status.to_string(),
            issuer_org: d.issuer_org,
            registrar: d.registrar,
            domain_expiry: d.domain_expiry,
            name_servers: d.name_servers,
            is_live: d.is_live,
            last_status_code: d.last_status_code,
            response_time_ms: d.response_time_ms,
            auto_renew: d.auto_renew,
            last_check_at: d.last_check_at,
            last_notification_at: d.last_notification_at,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

/// 查询所有监控域名，按更新时间倒序。
#[utoipa::path(
    get,
    path = "/v1/domains",
    tag = "Domains",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "监控域名列表", body = Vec<DomainResponse>),
        (status = 401, description = "未认证", body = ApiError)
    )
)]
pub async fn list_domains(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.list_domains(&Default::default()).await {
        Ok(domains) => {
            let body: Vec<DomainResponse> = domains.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => storage_error_response(e),
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AutoRenewRequest {
    pub auto_renew: bool,
}

#[derive(Serialize, ToSchema)]
pub struct AutoRenewResponse {
    pub id: String,
    pub auto_renew: bool,
}

/// 更新域名的自动续费提醒开关。
///
/// The flag never affects probing; it only gates renewal workflows that
/// live outside this service.
#[utoipa::path(
    put,
    path = "/v1/domains/{id}/auto-renew",
    tag = "Domains",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "域名记录 ID")),
    request_body = AutoRenewRequest,
    responses(
        (status = 200, description = "更新成功", body = AutoRenewResponse),
        (status = 401, description = "未认证", body = ApiError),
        (status = 404, description = "域名不存在", body = ApiError)
    )
)]
pub async fn update_auto_renew(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<AutoRenewRequest>,
) -> impl IntoResponse {
    let domain = match state.store.get_domain_by_id(&id).await {
        Ok(Some(domain)) => domain,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "domain not found"),
        Err(e) => return storage_error_response(e),
    };

    let patch = DomainPatch {
        auto_renew: Some(body.auto_renew),
        ..Default::default()
    };
    match state.store.upsert_domain(&domain.domain_name, &patch).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(AutoRenewResponse {
                id: updated.id,
                auto_renew: updated.auto_renew,
            }),
        )
            .into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// 软删除一个监控域名。
#[utoipa::path(
    delete,
    path = "/v1/domains/{id}",
    tag = "Domains",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "域名记录 ID")),
    responses(
        (status = 200, description = "已删除"),
        (status = 401, description = "未认证", body = ApiError),
        (status = 404, description = "域名不存在", body = ApiError)
    )
)]
pub async fn delete_domain(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.soft_delete_domain(&id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({"message": "domain deleted"})),
        )
            .into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "domain not found"),
        Err(e) => storage_error_response(e),
    }
}
