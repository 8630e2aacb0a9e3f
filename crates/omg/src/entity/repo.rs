//! Repo entity: one row per GitHub repository, owned or starred.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Timestamps are kept as the ISO-8601 text GitHub sent; SQLite's
/// `datetime()` understands them directly.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "omg_repo")]
pub struct Model {
    /// GitHub's numeric repository id.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,

    /// `owner/name`.
    pub full_name: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub private: bool,
    pub created_at: Option<String>,
    pub pushed_at: Option<String>,
    /// License key, e.g. "mit".
    pub license: Option<String>,

    pub stargazers_count: i64,
    pub watchers_count: i64,
    pub forks_count: i64,

    /// Primary language.
    pub lang: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub homepage: Option<String>,
    /// Size in KB as reported by the API.
    pub size: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::my_repo::Entity")]
    MyRepo,
    #[sea_orm(has_one = "super::my_star::Entity")]
    MyStar,
}

impl Related<super::my_repo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MyRepo.def()
    }
}

impl Related<super::my_star::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MyStar.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
