//! Repository table, the two marker tables, and the read views over them.

use sea_orm_migration::prelude::*;

/// Repository columns in the order every read path maps them.
const REPO_VIEW_COLUMNS: &str = "r.id, r.full_name, r.description, r.private, r.created_at, \
     r.license, r.pushed_at, r.stargazers_count, r.watchers_count, r.forks_count, r.lang, \
     r.homepage, r.size";

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_repo(manager).await?;
        self.create_markers(manager).await?;
        self.create_views(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        conn.execute_unprepared("DROP VIEW IF EXISTS omg_my_star_view")
            .await?;
        conn.execute_unprepared("DROP VIEW IF EXISTS omg_my_repo_view")
            .await?;

        manager
            .drop_table(Table::drop().table(OmgMyStar::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OmgMyRepo::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OmgRepo::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_repo(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OmgRepo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OmgRepo::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OmgRepo::FullName).string().null())
                    .col(ColumnDef::new(OmgRepo::Description).text().null())
                    .col(
                        ColumnDef::new(OmgRepo::Private)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(OmgRepo::CreatedAt).string().null())
                    .col(ColumnDef::new(OmgRepo::PushedAt).string().null())
                    .col(ColumnDef::new(OmgRepo::License).string().null())
                    // Statistics
                    .col(
                        ColumnDef::new(OmgRepo::StargazersCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OmgRepo::WatchersCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OmgRepo::ForksCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(OmgRepo::Lang).string().null())
                    .col(ColumnDef::new(OmgRepo::Homepage).text().null())
                    .col(
                        ColumnDef::new(OmgRepo::Size)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_omg_repo_full_name")
                    .table(OmgRepo::Table)
                    .col(OmgRepo::FullName)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn create_markers(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OmgMyRepo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OmgMyRepo::RepoId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_omg_my_repo_repo")
                            .from(OmgMyRepo::Table, OmgMyRepo::RepoId)
                            .to(OmgRepo::Table, OmgRepo::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OmgMyStar::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OmgMyStar::RepoId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OmgMyStar::StarredAt).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_omg_my_star_repo")
                            .from(OmgMyStar::Table, OmgMyStar::RepoId)
                            .to(OmgRepo::Table, OmgRepo::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_omg_my_star_starred_at")
                    .table(OmgMyStar::Table)
                    .col(OmgMyStar::StarredAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    /// The query builder selects from these by position, so column order
    /// here is part of the read contract.
    async fn create_views(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared(&format!(
            "CREATE VIEW IF NOT EXISTS omg_my_repo_view AS \
             SELECT {REPO_VIEW_COLUMNS} FROM omg_my_repo m JOIN omg_repo r ON r.id = m.repo_id"
        ))
        .await?;

        conn.execute_unprepared(&format!(
            "CREATE VIEW IF NOT EXISTS omg_my_star_view AS \
             SELECT s.starred_at, {REPO_VIEW_COLUMNS} FROM omg_my_star s \
             JOIN omg_repo r ON r.id = s.repo_id"
        ))
        .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum OmgRepo {
    Table,
    Id,
    FullName,
    Description,
    Private,
    CreatedAt,
    PushedAt,
    License,
    StargazersCount,
    WatchersCount,
    ForksCount,
    Lang,
    Homepage,
    Size,
}

#[derive(DeriveIden)]
enum OmgMyRepo {
    Table,
    RepoId,
}

#[derive(DeriveIden)]
enum OmgMyStar {
    Table,
    RepoId,
    StarredAt,
}
