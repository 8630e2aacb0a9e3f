//! GitHub records as the rest of the crate sees them.
//!
//! None of these borrow from the JSON document they were mapped from; a
//! caller owns whatever it receives.

use serde::Serialize;

/// A repository, owned or starred.
///
/// `id` is stable across syncs; every other field is last-write-wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub id: i64,
    /// `owner/name`.
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub private: bool,
    pub created_at: Option<String>,
    /// License key (`"mit"`, `"apache-2.0"`), absent when GitHub has none.
    pub license: Option<String>,
    pub pushed_at: Option<String>,
    pub stargazers_count: i64,
    pub watchers_count: i64,
    pub forks_count: i64,
    /// Primary language.
    pub lang: Option<String>,
    pub homepage: Option<String>,
    /// Size in kilobytes.
    pub size: i64,
}

/// A starred repository and when it was starred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Star {
    pub starred_at: Option<String>,
    pub repo: Repository,
}

/// Profile snapshot returned by whoami. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    pub login: Option<String>,
    pub id: i64,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub hireable: bool,
    pub bio: Option<String>,
    pub twitter_username: Option<String>,
    pub public_repos: i64,
    pub public_gists: i64,
    /// Only reported for the authenticated user.
    pub private_repos: Option<i64>,
    /// Only reported for the authenticated user.
    pub private_gists: Option<i64>,
    pub followers: i64,
    pub following: i64,
    pub created_at: Option<String>,
    /// Only reported for the authenticated user.
    pub disk_usage: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub sha: Option<String>,
    pub message: Option<String>,
    pub author: Option<String>,
    pub email: Option<String>,
    /// When the commit was authored.
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleaseAsset {
    pub id: i64,
    pub name: Option<String>,
    /// Size in bytes.
    pub size: i64,
    pub download_count: i64,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Release {
    pub id: i64,
    /// Login of the publishing author.
    pub login: Option<String>,
    pub name: Option<String>,
    pub tag_name: Option<String>,
    pub body: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    pub published_at: Option<String>,
    pub assets: Vec<ReleaseAsset>,
}

/// One row scraped from the trending page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrendingEntry {
    pub language: String,
    pub full_name: String,
    /// Stars gained in the trending period.
    pub stars: i64,
}

/// A trending entry is a repository projection carrying only language,
/// name and star count.
impl From<TrendingEntry> for Repository {
    fn from(entry: TrendingEntry) -> Self {
        Repository {
            full_name: Some(entry.full_name),
            lang: Some(entry.language),
            stargazers_count: entry.stars,
            ..Repository::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trending_entry_becomes_partial_repository() {
        let repo: Repository = TrendingEntry {
            language: "Rust".to_string(),
            full_name: "tokio-rs/tokio".to_string(),
            stars: 321,
        }
        .into();

        assert_eq!(repo.full_name.as_deref(), Some("tokio-rs/tokio"));
        assert_eq!(repo.lang.as_deref(), Some("Rust"));
        assert_eq!(repo.stargazers_count, 321);
        assert_eq!(repo.id, 0);
        assert_eq!(repo.description, None);
        assert_eq!(repo.created_at, None);
    }
}
