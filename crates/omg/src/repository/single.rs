use sea_orm::EntityTrait;

use super::Store;
use crate::entity::prelude::{MyStar, Repo};
use crate::error::Result;
use crate::github::Repository;

impl Store {
    pub async fn find_repo(&self, repo_id: i64) -> Result<Option<Repository>> {
        let model = Repo::find_by_id(repo_id).one(&self.db).await?;
        Ok(model.map(Repository::from))
    }

    /// `owner/name` of a stored repository.
    ///
    /// `None` when the id is unknown or the row has no name.
    pub async fn find_full_name(&self, repo_id: i64) -> Result<Option<String>> {
        let model = Repo::find_by_id(repo_id).one(&self.db).await?;
        Ok(model.and_then(|m| m.full_name))
    }

    /// Drop the star marker for `repo_id`. The repository row stays.
    ///
    /// Returns the number of markers removed (0 or 1).
    pub async fn delete_star(&self, repo_id: i64) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let result = MyStar::delete_by_id(repo_id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }
}
