use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection};
use std::path::Path;

use crate::error::Result;

pub mod domain;
pub mod notification;
pub mod project;
pub mod user;

pub use domain::DomainFilter;
pub use notification::{MessageTemplateUpdate, NotificationConfigUpdate, TelegramConfigUpdate};

/// Unified access layer for the management database (`zenstack.db`).
///
/// All methods are `async fn` backed by SeaORM + SQLite. The handle is
/// cheap to share behind an `Arc`; it is the only mutable global state in
/// the system.
pub struct Store {
    pub(crate) db: DatabaseConnection,
}

impl Store {
    /// Connect to (and initialize) the database under `data_dir`.
    ///
    /// Runs all pending `sea-orm-migration` migrations so the schema is
    /// current.
    pub async fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            sea_orm::DbErr::Custom(format!("cannot create data dir: {e}"))
        })?;
        let db_path = data_dir.join("zenstack.db");
        let url = format!(
            "sqlite://{}?mode=rwc",
            db_path.to_str().ok_or_else(|| sea_orm::DbErr::Custom(
                "non-UTF-8 data_dir path".to_string()
            ))?
        );
        let store = Self::connect(&url).await?;
        tracing::info!(path = %db_path.display(), "Initialized store");
        Ok(store)
    }

    /// Connect to an explicit database URL. Used by `new` and by tests
    /// (`sqlite::memory:`).
    pub async fn connect(url: &str) -> Result<Self> {
        let db = Database::connect(url).await?;
        db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        Migrator::up(&db, None).await?;
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
