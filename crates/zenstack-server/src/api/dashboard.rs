use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;
use zenstack_common::types::SslStatus;

use crate::api::{storage_error_response, ApiError};
use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_domains: usize,
    #[serde(rename = "sslCritical")]
    pub ssl_critical: usize,
    #[serde(rename = "sslWarning")]
    pub ssl_warning: usize,
    pub project_count: u64,
    /// Percentage of monitored domains currently live.
    pub global_availability: f64,
    pub sites_down: usize,
    pub suffix_distribution: HashMap<String, usize>,
    /// TLS expiries bucketed over the next 12 calendar months, keyed
    /// `YYYY-MM`.
    pub monthly_expiry: BTreeMap<String, usize>,
}

/// `example.co.uk -> .uk`; single-label names fall into "other".
fn extract_domain_suffix(domain_name: &str) -> String {
    let parts: Vec<&str> = domain_name.split('.').collect();
    if parts.len() < 2 {
        return "other".to_string();
    }
    format!(".{}", parts[parts.len() - 1])
}

/// 获取仪表盘统计数据。
#[utoipa::path(
    get,
    path = "/v1/dashboard/stats",
    tag = "Dashboard",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "仪表盘统计", body = DashboardStats),
        (status = 401, description = "未认证", body = ApiError)
    )
)]
pub async fn dashboard_stats(State(state): State<AppState>) -> impl IntoResponse {
    let domains = match state.store.list_domains(&Default::default()).await {
        Ok(domains) => domains,
        Err(e) => return storage_error_response(e),
    };
    let project_count = match state.store.count_projects().await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(error = %e, "Failed to count projects");
            0
        }
    };

    let total_domains = domains.len();
    let ssl_critical = domains
        .iter()
        .filter(|d| d.ssl_status == SslStatus::Critical)
        .count();
    let ssl_warning = domains
        .iter()
        .filter(|d| d.ssl_status == SslStatus::Warning)
        .count();
    let live = domains.iter().filter(|d| d.is_live).count();
    let sites_down = total_domains - live;
    let global_availability = if total_domains > 0 {
        live as f64 / total_domains as f64 * 100.0
    } else {
        0.0
    };

    let mut suffix_distribution: HashMap<String, usize> = HashMap::new();
    for domain in &domains {
        *suffix_distribution
            .entry(extract_domain_suffix(&domain.domain_name))
            .or_default() += 1;
    }

    // Pre-seed the next 12 months so the chart always has a full year.
    let now = Utc::now();
    let mut monthly_expiry: BTreeMap<String, usize> = BTreeMap::new();
    for i in 0..12u32 {
        let month0 = now.month0() + i;
        let year = now.year() + (month0 / 12) as i32;
        let month = month0 % 12 + 1;
        monthly_expiry.insert(format!("{year:04}-{month:02}"), 0);
    }
    for domain in &domains {
        if let Some(expiry) = domain.ssl_expiry {
            let key = expiry.format("%Y-%m").to_string();
            if let Some(count) = monthly_expiry.get_mut(&key) {
                *count += 1;
            }
        }
    }

    (
        StatusCode::OK,
        Json(DashboardStats {
            total_domains,
            ssl_critical,
            ssl_warning,
            project_count,
            global_availability,
            sites_down,
            suffix_distribution,
            monthly_expiry,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain_suffix() {
        assert_eq!(extract_domain_suffix("example.com"), ".com");
        assert_eq!(extract_domain_suffix("example.co.uk"), ".uk");
        assert_eq!(extract_domain_suffix("localhost"), "other");
    }
}
