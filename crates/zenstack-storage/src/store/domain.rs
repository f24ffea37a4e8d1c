use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use zenstack_common::types::{normalize_domain, DomainPatch, MonitoredDomain, SslStatus};

use crate::entities::monitored_domain::{self, Column as DomainCol, Entity as DomainEntity};
use crate::error::{Result, StorageError};
use crate::store::Store;

/// Filter for `list_domains`. Soft-deleted rows are always excluded.
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    pub ssl_status: Option<SslStatus>,
    pub is_live: Option<bool>,
}

fn model_to_domain(m: monitored_domain::Model) -> MonitoredDomain {
    let name_servers: Vec<String> = m
        .name_servers
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();
    MonitoredDomain {
        id: m.id,
        domain_name: m.domain_name,
        ssl_expiry: m.ssl_expiry.map(|t| t.with_timezone(&Utc)),
        ssl_status: m.ssl_status.parse().unwrap_or(SslStatus::Offline),
        issuer_org: m.issuer_org,
        registrar: m.registrar,
        domain_expiry: m.domain_expiry.map(|t| t.with_timezone(&Utc)),
        name_servers,
        is_live: m.is_live,
        last_status_code: m.last_status_code,
        response_time_ms: m.response_time_ms,
        auto_renew: m.auto_renew,
        last_check_at: m.last_check_at.map(|t| t.with_timezone(&Utc)),
        last_notification_at: m.last_notification_at.map(|t| t.with_timezone(&Utc)),
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn apply_patch(am: &mut monitored_domain::ActiveModel, patch: &DomainPatch) -> Result<()> {
    if let Some(expiry) = &patch.ssl_expiry {
        am.ssl_expiry = Set(expiry.map(|t| t.fixed_offset()));
    }
    if let Some(status) = patch.ssl_status {
        am.ssl_status = Set(status.to_string());
    }
    if let Some(issuer) = &patch.issuer_org {
        am.issuer_org = Set(issuer.clone());
    }
    if let Some(registrar) = &patch.registrar {
        am.registrar = Set(Some(registrar.clone()));
    }
    if let Some(expiry) = patch.domain_expiry {
        am.domain_expiry = Set(Some(expiry.fixed_offset()));
    }
    if let Some(ns) = &patch.name_servers {
        am.name_servers = Set(Some(serde_json::to_string(ns)?));
    }
    if let Some(live) = patch.is_live {
        am.is_live = Set(live);
    }
    if let Some(code) = patch.last_status_code {
        am.last_status_code = Set(code);
    }
    if let Some(rtt) = patch.response_time_ms {
        am.response_time_ms = Set(rtt);
    }
    if let Some(auto_renew) = patch.auto_renew {
        am.auto_renew = Set(auto_renew);
    }
    if let Some(ts) = patch.last_check_at {
        am.last_check_at = Set(Some(ts.fixed_offset()));
    }
    if let Some(ts) = patch.last_notification_at {
        am.last_notification_at = Set(Some(ts.fixed_offset()));
    }
    Ok(())
}

impl Store {
    /// Create-or-update by domain name in one call.
    ///
    /// Fields absent from `patch` keep their prior values; `updated_at`
    /// moves forward on every write. The name is normalized before the
    /// lookup so callers cannot create near-duplicate rows.
    pub async fn upsert_domain(&self, name: &str, patch: &DomainPatch) -> Result<MonitoredDomain> {
        let name = normalize_domain(name);
        let now = Utc::now().fixed_offset();

        let existing = DomainEntity::find()
            .filter(DomainCol::DomainName.eq(&name))
            .filter(DomainCol::DeletedAt.is_null())
            .one(self.db())
            .await?;

        match existing {
            Some(m) => {
                let mut am: monitored_domain::ActiveModel = m.into();
                apply_patch(&mut am, patch)?;
                am.updated_at = Set(now);
                let updated = am.update(self.db()).await?;
                Ok(model_to_domain(updated))
            }
            None => {
                let mut am = monitored_domain::ActiveModel {
                    id: Set(zenstack_common::id::next_id()),
                    domain_name: Set(name.clone()),
                    ssl_expiry: Set(None),
                    ssl_status: Set(SslStatus::Offline.to_string()),
                    issuer_org: Set(None),
                    registrar: Set(None),
                    domain_expiry: Set(None),
                    name_servers: Set(None),
                    is_live: Set(false),
                    last_status_code: Set(0),
                    response_time_ms: Set(0),
                    auto_renew: Set(false),
                    last_check_at: Set(None),
                    last_notification_at: Set(None),
                    created_at: Set(now),
                    updated_at: Set(now),
                    deleted_at: Set(None),
                };
                apply_patch(&mut am, patch)?;
                let inserted = am
                    .insert(self.db())
                    .await
                    .map_err(|e| StorageError::from_db("monitored_domain", &name, e))?;
                Ok(model_to_domain(inserted))
            }
        }
    }

    /// List monitored domains, newest update first.
    pub async fn list_domains(&self, filter: &DomainFilter) -> Result<Vec<MonitoredDomain>> {
        let mut q = DomainEntity::find().filter(DomainCol::DeletedAt.is_null());
        if let Some(status) = filter.ssl_status {
            q = q.filter(DomainCol::SslStatus.eq(status.to_string()));
        }
        if let Some(live) = filter.is_live {
            q = q.filter(DomainCol::IsLive.eq(live));
        }
        let rows = q
            .order_by(DomainCol::UpdatedAt, Order::Desc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(model_to_domain).collect())
    }

    pub async fn get_domain_by_name(&self, name: &str) -> Result<Option<MonitoredDomain>> {
        let name = normalize_domain(name);
        let model = DomainEntity::find()
            .filter(DomainCol::DomainName.eq(name))
            .filter(DomainCol::DeletedAt.is_null())
            .one(self.db())
            .await?;
        Ok(model.map(model_to_domain))
    }

    pub async fn get_domain_by_id(&self, id: &str) -> Result<Option<MonitoredDomain>> {
        let model = DomainEntity::find_by_id(id)
            .filter(DomainCol::DeletedAt.is_null())
            .one(self.db())
            .await?;
        Ok(model.map(model_to_domain))
    }

    /// Mark a row deleted. Soft-deleted rows drop out of every query but
    /// keep their history. Returns false when the id does not exist.
    pub async fn soft_delete_domain(&self, id: &str) -> Result<bool> {
        let model = DomainEntity::find_by_id(id)
            .filter(DomainCol::DeletedAt.is_null())
            .one(self.db())
            .await?;
        let Some(m) = model else {
            return Ok(false);
        };
        let now = Utc::now().fixed_offset();
        let mut am: monitored_domain::ActiveModel = m.into();
        am.deleted_at = Set(Some(now));
        am.updated_at = Set(now);
        am.update(self.db()).await?;
        Ok(true)
    }

    pub async fn count_domains(&self) -> Result<u64> {
        Ok(DomainEntity::find()
            .filter(DomainCol::DeletedAt.is_null())
            .count(self.db())
            .await?)
    }
}
