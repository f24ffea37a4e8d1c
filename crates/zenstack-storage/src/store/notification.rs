use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder,
};
use zenstack_common::types::{
    DeliveryRecord, MessageTemplate, NotificationConfig, TelegramConfig,
};

use crate::entities::message_template::{self, Column as TemplateCol, Entity as TemplateEntity};
use crate::entities::notification_config::{self, Column as ConfigCol, Entity as ConfigEntity};
use crate::entities::notification_log::{self, Entity as LogEntity};
use crate::entities::telegram_config::{self, Column as TelegramCol, Entity as TelegramEntity};
use crate::error::{Result, StorageError};
use crate::store::Store;

/// Partial update for a webhook config row.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct NotificationConfigUpdate {
    pub platform: Option<String>,
    pub endpoint: Option<String>,
    pub secret: Option<Option<String>>,
    pub active: Option<bool>,
}

/// Partial update for a message template row.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct MessageTemplateUpdate {
    pub title_template: Option<String>,
    pub body_template: Option<String>,
    pub text_template: Option<String>,
}

/// Partial update for a Telegram config row.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TelegramConfigUpdate {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub active: Option<bool>,
}

fn model_to_config(m: notification_config::Model) -> NotificationConfig {
    NotificationConfig {
        id: m.id,
        platform: m.platform,
        endpoint: m.endpoint,
        secret: m.secret,
        active: m.active,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn model_to_template(m: message_template::Model) -> MessageTemplate {
    MessageTemplate {
        id: m.id,
        event_name: m.event_name,
        title_template: m.title_template,
        body_template: m.body_template,
        text_template: m.text_template,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn model_to_telegram(m: telegram_config::Model) -> TelegramConfig {
    TelegramConfig {
        id: m.id,
        bot_token: m.bot_token,
        chat_id: m.chat_id,
        active: m.active,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl Store {
    // ---- notification_configs ----

    pub async fn insert_notification_config(
        &self,
        platform: &str,
        endpoint: &str,
        secret: Option<&str>,
        active: bool,
    ) -> Result<NotificationConfig> {
        let now = Utc::now().fixed_offset();
        let am = notification_config::ActiveModel {
            id: Set(zenstack_common::id::next_id()),
            platform: Set(platform.to_string()),
            endpoint: Set(endpoint.to_string()),
            secret: Set(secret.map(|s| s.to_string())),
            active: Set(active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = am.insert(self.db()).await?;
        Ok(model_to_config(inserted))
    }

    pub async fn list_notification_configs(&self) -> Result<Vec<NotificationConfig>> {
        let rows = ConfigEntity::find()
            .order_by(ConfigCol::CreatedAt, Order::Desc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(model_to_config).collect())
    }

    /// Configs consulted on every notification fan-out.
    pub async fn list_active_notification_configs(&self) -> Result<Vec<NotificationConfig>> {
        let rows = ConfigEntity::find()
            .filter(ConfigCol::Active.eq(true))
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(model_to_config).collect())
    }

    pub async fn update_notification_config(
        &self,
        id: &str,
        update: &NotificationConfigUpdate,
    ) -> Result<Option<NotificationConfig>> {
        let model = ConfigEntity::find_by_id(id).one(self.db()).await?;
        let Some(m) = model else {
            return Ok(None);
        };
        let mut am: notification_config::ActiveModel = m.into();
        if let Some(ref platform) = update.platform {
            am.platform = Set(platform.clone());
        }
        if let Some(ref endpoint) = update.endpoint {
            am.endpoint = Set(endpoint.clone());
        }
        if let Some(ref secret) = update.secret {
            am.secret = Set(secret.clone());
        }
        if let Some(active) = update.active {
            am.active = Set(active);
        }
        am.updated_at = Set(Utc::now().fixed_offset());
        let updated = am.update(self.db()).await?;
        Ok(Some(model_to_config(updated)))
    }

    pub async fn delete_notification_config(&self, id: &str) -> Result<bool> {
        let res = ConfigEntity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }

    // ---- message_templates ----

    pub async fn insert_message_template(
        &self,
        event_name: &str,
        title_template: &str,
        body_template: &str,
        text_template: &str,
    ) -> Result<MessageTemplate> {
        let now = Utc::now().fixed_offset();
        let am = message_template::ActiveModel {
            id: Set(zenstack_common::id::next_id()),
            event_name: Set(event_name.to_string()),
            title_template: Set(title_template.to_string()),
            body_template: Set(body_template.to_string()),
            text_template: Set(text_template.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = am
            .insert(self.db())
            .await
            .map_err(|e| StorageError::from_db("message_template", event_name, e))?;
        Ok(model_to_template(inserted))
    }

    pub async fn list_message_templates(&self) -> Result<Vec<MessageTemplate>> {
        let rows = TemplateEntity::find()
            .order_by(TemplateCol::CreatedAt, Order::Desc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(model_to_template).collect())
    }

    pub async fn get_template_by_event(&self, event_name: &str) -> Result<Option<MessageTemplate>> {
        let model = TemplateEntity::find()
            .filter(TemplateCol::EventName.eq(event_name))
            .one(self.db())
            .await?;
        Ok(model.map(model_to_template))
    }

    pub async fn update_message_template(
        &self,
        id: &str,
        update: &MessageTemplateUpdate,
    ) -> Result<Option<MessageTemplate>> {
        let model = TemplateEntity::find_by_id(id).one(self.db()).await?;
        let Some(m) = model else {
            return Ok(None);
        };
        let mut am: message_template::ActiveModel = m.into();
        if let Some(ref title) = update.title_template {
            am.title_template = Set(title.clone());
        }
        if let Some(ref body) = update.body_template {
            am.body_template = Set(body.clone());
        }
        if let Some(ref text) = update.text_template {
            am.text_template = Set(text.clone());
        }
        am.updated_at = Set(Utc::now().fixed_offset());
        let updated = am.update(self.db()).await?;
        Ok(Some(model_to_template(updated)))
    }

    pub async fn delete_message_template(&self, id: &str) -> Result<bool> {
        let res = TemplateEntity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }

    // ---- telegram_configs ----

    pub async fn insert_telegram_config(
        &self,
        bot_token: &str,
        chat_id: &str,
        active: bool,
    ) -> Result<TelegramConfig> {
        let now = Utc::now().fixed_offset();
        let am = telegram_config::ActiveModel {
            id: Set(zenstack_common::id::next_id()),
            bot_token: Set(bot_token.to_string()),
            chat_id: Set(chat_id.to_string()),
            active: Set(active),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = am.insert(self.db()).await?;
        Ok(model_to_telegram(inserted))
    }

    pub async fn list_telegram_configs(&self) -> Result<Vec<TelegramConfig>> {
        let rows = TelegramEntity::find()
            .order_by(TelegramCol::CreatedAt, Order::Desc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(model_to_telegram).collect())
    }

    pub async fn list_active_telegram_configs(&self) -> Result<Vec<TelegramConfig>> {
        let rows = TelegramEntity::find()
            .filter(TelegramCol::Active.eq(true))
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(model_to_telegram).collect())
    }

    pub async fn get_telegram_config_by_id(&self, id: &str) -> Result<Option<TelegramConfig>> {
        let model = TelegramEntity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(model_to_telegram))
    }

    pub async fn update_telegram_config(
        &self,
        id: &str,
        update: &TelegramConfigUpdate,
    ) -> Result<Option<TelegramConfig>> {
        let model = TelegramEntity::find_by_id(id).one(self.db()).await?;
        let Some(m) = model else {
            return Ok(None);
        };
        let mut am: telegram_config::ActiveModel = m.into();
        if let Some(ref token) = update.bot_token {
            am.bot_token = Set(token.clone());
        }
        if let Some(ref chat_id) = update.chat_id {
            am.chat_id = Set(chat_id.clone());
        }
        if let Some(active) = update.active {
            am.active = Set(active);
        }
        am.updated_at = Set(Utc::now().fixed_offset());
        let updated = am.update(self.db()).await?;
        Ok(Some(model_to_telegram(updated)))
    }

    pub async fn delete_telegram_config(&self, id: &str) -> Result<bool> {
        let res = TelegramEntity::delete_by_id(id).exec(self.db()).await?;
        Ok(res.rows_affected > 0)
    }

    // ---- notification_logs ----

    /// Record one delivery attempt. Failures here are logged by callers
    /// and never abort the fan-out.
    pub async fn insert_delivery_record(
        &self,
        event_name: &str,
        domain_name: &str,
        channel: &str,
        ok: bool,
        error: Option<&str>,
    ) -> Result<DeliveryRecord> {
        let now = Utc::now().fixed_offset();
        let am = notification_log::ActiveModel {
            id: Set(zenstack_common::id::next_id()),
            event_name: Set(event_name.to_string()),
            domain_name: Set(domain_name.to_string()),
            channel: Set(channel.to_string()),
            ok: Set(ok),
            error: Set(error.map(|e| e.to_string())),
            created_at: Set(now),
        };
        let inserted = am.insert(self.db()).await?;
        Ok(DeliveryRecord {
            id: inserted.id,
            event_name: inserted.event_name,
            domain_name: inserted.domain_name,
            channel: inserted.channel,
            ok: inserted.ok,
            error: inserted.error,
            created_at: inserted.created_at.with_timezone(&Utc),
        })
    }

    pub async fn list_delivery_records(&self, limit: u64) -> Result<Vec<DeliveryRecord>> {
        use sea_orm::QuerySelect;
        let rows = LogEntity::find()
            .order_by(
                crate::entities::notification_log::Column::CreatedAt,
                Order::Desc,
            )
            .limit(limit)
            .all(self.db())
            .await?;
        Ok(rows
            .into_iter()
            .map(|m| DeliveryRecord {
                id: m.id,
                event_name: m.event_name,
                domain_name: m.domain_name,
                channel: m.channel,
                ok: m.ok,
                error: m.error,
                created_at: m.created_at.with_timezone(&Utc),
            })
            .collect())
    }
}
