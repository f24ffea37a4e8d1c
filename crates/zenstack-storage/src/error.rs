/// Errors that can occur within the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A required record was not found.
    #[error("Storage: {entity} not found ({key})")]
    NotFound { entity: &'static str, key: String },

    /// A uniqueness constraint was violated (duplicate domain name,
    /// duplicate template event name).
    #[error("Storage: conflict on {entity}: {key}")]
    Conflict { entity: &'static str, key: String },

    /// The underlying database rejected or failed the operation.
    #[error("Storage: database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// JSON serialization or deserialization failure (e.g. the
    /// name_servers column).
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    /// Wraps a `DbErr`, promoting unique-index violations to `Conflict`
    /// so callers can map them to HTTP 409.
    pub(crate) fn from_db(entity: &'static str, key: &str, err: sea_orm::DbErr) -> Self {
        let msg = err.to_string();
        if msg.contains("UNIQUE constraint failed") || msg.contains("unique constraint") {
            StorageError::Conflict {
                entity,
                key: key.to_string(),
            }
        } else {
            StorageError::Database(err)
        }
    }
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
