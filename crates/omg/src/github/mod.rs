//! GitHub access: the API client, page fetching, JSON mapping, and the
//! trending scraper.
//!
//! ```ignore
//! use omg::github::GitHubClient;
//!
//! let client = GitHubClient::new(&token)?;
//! let me = client.whoami(None).await?;
//! let hot = client.trending("rust", "weekly").await?;
//! ```

mod client;
pub mod convert;
mod pagination;
mod trending;
mod types;

pub use client::{API_ROOT, GitHubClient, WEB_ROOT};
pub use convert::{
    asset_from_json, commit_from_json, release_from_json, repo_from_json, repo_to_active_model,
    star_from_json, user_from_json,
};
pub use pagination::{PER_PAGE, PageKind};
pub use trending::{MAX_TRENDING, TrendingScraper};
pub use types::{Commit, Release, ReleaseAsset, Repository, Star, TrendingEntry, User};
