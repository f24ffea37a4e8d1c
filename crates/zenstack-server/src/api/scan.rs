use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zenstack_common::types::{days_remaining, normalize_domain};

use crate::api::{error_response, ApiError};
use crate::monitor::engine;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ScanQuery {
    domains: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScanResultEntry {
    pub domain_name: String,
    pub status: String,
    pub expiry_date: Option<DateTime<Utc>>,
    pub expiry_date_human: String,
    pub days_remaining: i64,
    pub issuer: String,
    pub registrar: String,
    pub domain_expiry_date: Option<DateTime<Utc>>,
    pub name_servers: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScanSummary {
    pub total_scanned: usize,
    pub at_risk: usize,
}

#[derive(Serialize, ToSchema)]
pub struct ScanResponse {
    pub results: Vec<ScanResultEntry>,
    pub summary: ScanSummary,
}

/// 对一组域名执行即时扫描并把结果并入监控集合。
///
/// Runs the ad-hoc TLS/WHOIS scan through the same worker pool as the
/// scheduled sweep, synchronously with respect to the caller. Observed
/// names are lazily created in the monitored set.
#[utoipa::path(
    get,
    path = "/v1/scan",
    tag = "Scan",
    security(("bearer_auth" = [])),
    params(
        ("domains" = String, Query, description = "逗号分隔的域名列表")
    ),
    responses(
        (status = 200, description = "扫描结果", body = ScanResponse),
        (status = 400, description = "缺少 domains 参数", body = ApiError),
        (status = 401, description = "未认证", body = ApiError)
    )
)]
pub async fn scan_domains(
    State(state): State<AppState>,
    Query(query): Query<ScanQuery>,
) -> impl IntoResponse {
    let Some(raw) = query.domains else {
        return error_response(StatusCode::BAD_REQUEST, "domains parameter is required");
    };

    let names: Vec<String> = raw
        .split(',')
        .map(normalize_domain)
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "at least one valid domain is required");
    }

    let outcomes = state.scanner.scan(names).await;
    let thresholds = engine::Thresholds {
        critical_days: state.config.scan.critical_threshold_days,
        warning_days: state.config.scan.warning_threshold_days,
        renotify_window: chrono::Duration::hours(state.config.notifications.renotify_window_hours),
    };

    let mut results = Vec::with_capacity(outcomes.len());
    let mut at_risk = 0usize;

    for outcome in &outcomes {
        let now = Utc::now();
        let status = engine::classify(&outcome.tls, now, &thresholds);
        if status.is_at_risk() {
            at_risk += 1;
        }

        // Persist through the same patch the sweep would write. Ad-hoc
        // scans update state silently: no transition notifications.
        let prior = match state.store.get_domain_by_name(&outcome.domain_name).await {
            Ok(prior) => prior,
            Err(e) => {
                tracing::error!(domain = %outcome.domain_name, error = %e, "Prior lookup failed");
                None
            }
        };
        let (patch, _events) =
            engine::apply_tls(prior.as_ref(), &outcome.tls, &outcome.whois, now, &thresholds);
        if let Err(e) = state.store.upsert_domain(&outcome.domain_name, &patch).await {
            tracing::error!(domain = %outcome.domain_name, error = %e, "Scan upsert failed");
        }

        let days = outcome
            .tls
            .not_after
            .map(|e| days_remaining(e, now))
            .unwrap_or(0);
        results.push(ScanResultEntry {
            domain_name: outcome.domain_name.clone(),
            status: status.to_string(),
            expiry_date: outcome.tls.not_after,
            expiry_date_human: outcome
                .tls
                .not_after
                .map(|e| e.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            days_remaining: days,
            issuer: outcome.tls.issuer_org.clone().unwrap_or_default(),
            registrar: outcome.whois.registrar.clone().unwrap_or_default(),
            domain_expiry_date: outcome.whois.expires_at,
            name_servers: outcome.whois.nameservers.clone(),
        });
    }

    let total_scanned = results.len();
    (
        StatusCode::OK,
        Json(ScanResponse {
            results,
            summary: ScanSummary {
                total_scanned,
                at_risk,
            },
        }),
    )
        .into_response()
}
