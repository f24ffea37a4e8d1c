use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
};
use zenstack_common::types::User;

use crate::entities::user::{self, Column as UserCol, Entity as UserEntity};
use crate::error::{Result, StorageError};
use crate::store::Store;

fn model_to_user(m: user::Model) -> User {
    User {
        id: m.id,
        username: m.username,
        password_hash: m.password_hash,
        role: m.role,
        status: m.status,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

impl Store {
    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
        status: &str,
    ) -> Result<User> {
        let now = Utc::now().fixed_offset();
        let am = user::ActiveModel {
            id: Set(zenstack_common::id::next_id()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            role: Set(role.to_string()),
            status: Set(status.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = am
            .insert(self.db())
            .await
            .map_err(|e| StorageError::from_db("user", username, e))?;
        Ok(model_to_user(inserted))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let model = UserEntity::find()
            .filter(UserCol::Username.eq(username))
            .one(self.db())
            .await?;
        Ok(model.map(model_to_user))
    }

    pub async fn count_users(&self) -> Result<u64> {
        Ok(UserEntity::find().count(self.db()).await?)
    }
}
