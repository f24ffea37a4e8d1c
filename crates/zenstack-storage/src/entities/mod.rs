pub mod message_template;
pub mod monitored_domain;
pub mod notification_config;
pub mod notification_log;
pub mod project;
pub mod telegram_config;
pub mod user;
