use sea_orm::{EntityTrait, PaginatorTrait};

use crate::entities::project::Entity as ProjectEntity;
use crate::error::Result;
use crate::store::Store;

impl Store {
    /// Project rows belong to the scaffolder; the dashboard only needs
    /// the count.
    pub async fn count_projects(&self) -> Result<u64> {
        Ok(ProjectEntity::find().count(self.db()).await?)
    }
}
