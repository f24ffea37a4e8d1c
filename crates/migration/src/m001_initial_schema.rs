use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_initial_schema"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DOWN_SQL)
            .await?;
        Ok(())
    }
}

const UP_SQL: &str = "
PRAGMA journal_mode=WAL;

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'viewer',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS monitored_domains (
    id TEXT PRIMARY KEY NOT NULL,
    domain_name TEXT NOT NULL UNIQUE,
    ssl_expiry TEXT,
    ssl_status TEXT NOT NULL DEFAULT 'Offline',
    issuer_org TEXT,
    registrar TEXT,
    domain_expiry TEXT,
    name_servers TEXT,
    is_live INTEGER NOT NULL DEFAULT 0,
    last_status_code INTEGER NOT NULL DEFAULT 0,
    response_time_ms INTEGER NOT NULL DEFAULT 0,
    auto_renew INTEGER NOT NULL DEFAULT 0,
    last_check_at TEXT,
    last_notification_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_monitored_domains_updated_at ON monitored_domains(updated_at DESC);
CREATE INDEX IF NOT EXISTS idx_monitored_domains_ssl_status ON monitored_domains(ssl_status);
CREATE INDEX IF NOT EXISTS idx_monitored_domains_is_live ON monitored_domains(is_live);

CREATE TABLE IF NOT EXISTS notification_configs (
    id TEXT PRIMARY KEY NOT NULL,
    platform TEXT NOT NULL,
    endpoint TEXT NOT NULL,
    secret TEXT,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notification_configs_active ON notification_configs(active);

CREATE TABLE IF NOT EXISTS message_templates (
    id TEXT PRIMARY KEY NOT NULL,
    event_name TEXT NOT NULL UNIQUE,
    title_template TEXT NOT NULL DEFAULT '',
    body_template TEXT NOT NULL DEFAULT '',
    text_template TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS telegram_configs (
    id TEXT PRIMARY KEY NOT NULL,
    bot_token TEXT NOT NULL,
    chat_id TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_telegram_configs_active ON telegram_configs(active);

CREATE TABLE IF NOT EXISTS notification_logs (
    id TEXT PRIMARY KEY NOT NULL,
    event_name TEXT NOT NULL,
    domain_name TEXT NOT NULL,
    channel TEXT NOT NULL,
    ok INTEGER NOT NULL DEFAULT 0,
    error TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notification_logs_created_at ON notification_logs(created_at);
CREATE INDEX IF NOT EXISTS idx_notification_logs_domain ON notification_logs(domain_name);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    github_repo TEXT,
    template_type TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

const DOWN_SQL: &str = "
DROP TABLE IF EXISTS projects;
DROP TABLE IF EXISTS notification_logs;
DROP TABLE IF EXISTS telegram_configs;
DROP TABLE IF EXISTS message_templates;
DROP TABLE IF EXISTS notification_configs;
DROP TABLE IF EXISTS monitored_domains;
DROP TABLE IF EXISTS users;
";
