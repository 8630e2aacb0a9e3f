use sea_orm::{
    ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, Set, TransactionTrait,
    sea_query::OnConflict,
};

use super::Store;
use crate::entity::my_repo::{ActiveModel as MyRepoActiveModel, Column as MyRepoColumn};
use crate::entity::my_star::{ActiveModel as MyStarActiveModel, Column as MyStarColumn};
use crate::entity::prelude::{MyRepo, MyStar, Repo};
use crate::entity::repo::Column;
use crate::error::Result;
use crate::github::{Repository, Star, repo_to_active_model};

/// What one batch write did.
///
/// A failed row is logged and recorded here. Only a page where every row
/// fails is rolled back and returned as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Rows whose repository and marker were both written.
    pub saved: usize,
    /// One message per row that failed.
    pub errors: Vec<String>,
}

impl UpsertOutcome {
    /// Count or log one row, handing back its error.
    fn record(
        &mut self,
        repo: &Repository,
        result: std::result::Result<(), DbErr>,
    ) -> Option<DbErr> {
        match result {
            Ok(()) => {
                self.saved += 1;
                None
            }
            Err(e) => {
                tracing::warn!(
                    repo_id = repo.id,
                    full_name = repo.full_name.as_deref().unwrap_or(""),
                    error = %e,
                    "failed to save row, continuing"
                );
                self.errors.push(format!(
                    "repo {} ({}): {e}",
                    repo.id,
                    repo.full_name.as_deref().unwrap_or("?")
                ));
                Some(e)
            }
        }
    }
}

/// A page where no row could be written means the store itself is broken
/// (missing table, wrong schema), so the page fails instead of committing.
fn finish_page(
    outcome: UpsertOutcome,
    rows: usize,
    last_error: Option<DbErr>,
) -> Result<UpsertOutcome> {
    match last_error {
        Some(e) if rows > 0 && outcome.saved == 0 => Err(e.into()),
        _ => Ok(outcome),
    }
}

async fn close_page(
    txn: DatabaseTransaction,
    page: Result<UpsertOutcome>,
) -> Result<UpsertOutcome> {
    match page {
        Ok(outcome) => {
            txn.commit().await?;
            Ok(outcome)
        }
        Err(e) => {
            txn.rollback().await?;
            Err(e)
        }
    }
}

/// Conflict on id overwrites every mutable column.
pub(crate) fn repo_on_conflict() -> OnConflict {
    OnConflict::column(Column::Id)
        .update_columns([
            Column::FullName,
            Column::Description,
            Column::Private,
            Column::CreatedAt,
            Column::License,
            Column::PushedAt,
            Column::StargazersCount,
            Column::WatchersCount,
            Column::ForksCount,
            Column::Lang,
            Column::Homepage,
            Column::Size,
        ])
        .to_owned()
}

async fn upsert_repo<C: ConnectionTrait>(
    db: &C,
    repo: &Repository,
) -> std::result::Result<(), DbErr> {
    Repo::insert(repo_to_active_model(repo))
        .on_conflict(repo_on_conflict())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Insert-or-ignore: an existing marker is never touched.
async fn mark_mine<C: ConnectionTrait>(db: &C, repo_id: i64) -> std::result::Result<(), DbErr> {
    MyRepo::insert(MyRepoActiveModel {
        repo_id: Set(repo_id),
    })
    .on_conflict(OnConflict::column(MyRepoColumn::RepoId).do_nothing().to_owned())
    .exec_without_returning(db)
    .await?;
    Ok(())
}

/// Re-starring refreshes `starred_at`; there is never more than one row.
async fn mark_starred<C: ConnectionTrait>(
    db: &C,
    repo_id: i64,
    starred_at: Option<String>,
) -> std::result::Result<(), DbErr> {
    MyStar::insert(MyStarActiveModel {
        repo_id: Set(repo_id),
        starred_at: Set(starred_at),
    })
    .on_conflict(
        OnConflict::column(MyStarColumn::RepoId)
            .update_column(MyStarColumn::StarredAt)
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;
    Ok(())
}

impl Store {
    /// Save one page of the user's own repositories.
    ///
    /// The whole page is one transaction, committed before this returns.
    /// A failing row is skipped; a page on which every row fails is an error
    /// and nothing is committed.
    pub async fn save_my_repos(&self, repos: &[Repository]) -> Result<UpsertOutcome> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let mut outcome = UpsertOutcome::default();
        let mut last_error = None;
        for repo in repos {
            let result = save_mine(&txn, repo).await;
            last_error = outcome.record(repo, result).or(last_error);
        }

        close_page(txn, finish_page(outcome, repos.len(), last_error)).await
    }

    /// Save one page of the user's stars.
    pub async fn save_my_stars(&self, stars: &[Star]) -> Result<UpsertOutcome> {
        let _guard = self.write_lock.lock().await;
        let txn = self.db.begin().await?;

        let mut outcome = UpsertOutcome::default();
        let mut last_error = None;
        for star in stars {
            let result = save_star(&txn, star).await;
            last_error = outcome.record(&star.repo, result).or(last_error);
        }

        close_page(txn, finish_page(outcome, stars.len(), last_error)).await
    }
}

async fn save_mine(
    txn: &DatabaseTransaction,
    repo: &Repository,
) -> std::result::Result<(), DbErr> {
    upsert_repo(txn, repo).await?;
    mark_mine(txn, repo.id).await
}

async fn save_star(txn: &DatabaseTransaction, star: &Star) -> std::result::Result<(), DbErr> {
    upsert_repo(txn, &star.repo).await?;
    mark_starred(txn, star.repo.id, star.starred_at.clone()).await
}
