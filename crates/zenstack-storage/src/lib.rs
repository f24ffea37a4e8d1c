//! Durable store for monitored domains, notification configuration, and
//! the delivery log.
//!
//! Backed by SeaORM over SQLite with WAL mode. All access goes through a
//! single explicitly-constructed [`store::Store`] handle; there are no
//! process-wide singletons here.

pub mod entities;
pub mod error;
pub mod store;

#[cfg(test)]
mod tests;

pub use error::{Result, StorageError};
pub use store::{
    DomainFilter, MessageTemplateUpdate, NotificationConfigUpdate, Store, TelegramConfigUpdate,
};
