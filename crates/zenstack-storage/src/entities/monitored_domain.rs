use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "monitored_domains")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub domain_name: String,
    pub ssl_expiry: Option<DateTimeWithTimeZone>,
    pub ssl_status: String,
    pub issuer_org: Option<String>,
    pub registrar: Option<String>,
    pub domain_expiry: Option<DateTimeWithTimeZone>,
    /// JSON-encoded list of nameserver hosts.
    pub name_servers: Option<String>,
    pub is_live: bool,
    pub last_status_code: i32,
    pub response_time_ms: i32,
    pub auto_renew: bool,
    pub last_check_at: Option<DateTimeWithTimeZone>,
    pub last_notification_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
