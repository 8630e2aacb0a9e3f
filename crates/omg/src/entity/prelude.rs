//! Common re-exports for convenient entity usage.

pub use super::my_repo::{
    ActiveModel as MyRepoActiveModel, Column as MyRepoColumn, Entity as MyRepo,
    Model as MyRepoModel,
};
pub use super::my_star::{
    ActiveModel as MyStarActiveModel, Column as MyStarColumn, Entity as MyStar,
    Model as MyStarModel,
};
pub use super::repo::{
    ActiveModel as RepoActiveModel, Column as RepoColumn, Entity as Repo, Model as RepoModel,
};
