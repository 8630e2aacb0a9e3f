//! Mapping GitHub JSON documents to omg records, and records to rows.
//!
//! Every mapper is total. A key that is missing, JSON-null, or of the wrong
//! type maps to the absent value: `None` for text, `0` for numbers, `false`
//! for flags.

use sea_orm::Set;
use serde_json::Value;

use super::types::{Commit, Release, ReleaseAsset, Repository, Star, User};
use crate::entity::repo::{ActiveModel as RepoActiveModel, Model as RepoModel};

fn text(node: &Value, key: &str) -> Option<String> {
    node.get(key).and_then(Value::as_str).map(str::to_string)
}

fn int(node: &Value, key: &str) -> i64 {
    node.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn flag(node: &Value, key: &str) -> bool {
    node.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Nested object under `key`, or `None` when missing or null.
fn object<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    node.get(key).filter(|v| !v.is_null())
}

/// Like [`int`], but keeps "not reported" distinct from zero.
fn reported_int(node: &Value, key: &str) -> Option<i64> {
    node.get(key).and_then(Value::as_i64)
}

pub fn repo_from_json(node: &Value) -> Repository {
    Repository {
        id: int(node, "id"),
        full_name: text(node, "full_name"),
        description: text(node, "description"),
        private: flag(node, "private"),
        created_at: text(node, "created_at"),
        license: object(node, "license").and_then(|license| text(license, "key")),
        pushed_at: text(node, "pushed_at"),
        stargazers_count: int(node, "stargazers_count"),
        watchers_count: int(node, "watchers_count"),
        forks_count: int(node, "forks_count"),
        lang: text(node, "language"),
        homepage: text(node, "homepage"),
        size: int(node, "size"),
    }
}

/// One element of the starred listing: `{ "starred_at": ..., "repo": {...} }`.
///
/// `None` when the element carries no repository object; there is nothing to
/// key a row on.
pub fn star_from_json(node: &Value) -> Option<Star> {
    let repo = object(node, "repo").filter(|repo| repo.is_object())?;
    Some(Star {
        starred_at: text(node, "starred_at"),
        repo: repo_from_json(repo),
    })
}

pub fn user_from_json(node: &Value) -> User {
    User {
        login: text(node, "login"),
        id: int(node, "id"),
        name: text(node, "name"),
        company: text(node, "company"),
        blog: text(node, "blog"),
        location: text(node, "location"),
        email: text(node, "email"),
        hireable: flag(node, "hireable"),
        bio: text(node, "bio"),
        twitter_username: text(node, "twitter_username"),
        public_repos: int(node, "public_repos"),
        public_gists: int(node, "public_gists"),
        private_repos: reported_int(node, "total_private_repos"),
        private_gists: reported_int(node, "private_gists"),
        followers: int(node, "followers"),
        following: int(node, "following"),
        created_at: text(node, "created_at"),
        disk_usage: reported_int(node, "disk_usage"),
    }
}

pub fn commit_from_json(node: &Value) -> Commit {
    let detail = object(node, "commit");
    let author = detail.and_then(|d| object(d, "author"));
    Commit {
        sha: text(node, "sha"),
        message: detail.and_then(|d| text(d, "message")),
        author: author.and_then(|a| text(a, "name")),
        email: author.and_then(|a| text(a, "email")),
        date: author.and_then(|a| text(a, "date")),
    }
}

pub fn asset_from_json(node: &Value) -> ReleaseAsset {
    ReleaseAsset {
        id: int(node, "id"),
        name: text(node, "name"),
        size: int(node, "size"),
        download_count: int(node, "download_count"),
        download_url: text(node, "browser_download_url"),
    }
}

pub fn release_from_json(node: &Value) -> Release {
    let assets = node
        .get("assets")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(asset_from_json).collect())
        .unwrap_or_default();

    Release {
        id: int(node, "id"),
        login: object(node, "author").and_then(|a| text(a, "login")),
        name: text(node, "name"),
        tag_name: text(node, "tag_name"),
        body: text(node, "body"),
        draft: flag(node, "draft"),
        prerelease: flag(node, "prerelease"),
        published_at: text(node, "published_at"),
        assets,
    }
}

/// Every column set, so an upsert overwrites all mutable fields.
pub fn repo_to_active_model(repo: &Repository) -> RepoActiveModel {
    RepoActiveModel {
        id: Set(repo.id),
        full_name: Set(repo.full_name.clone()),
        description: Set(repo.description.clone()),
        private: Set(repo.private),
        created_at: Set(repo.created_at.clone()),
        pushed_at: Set(repo.pushed_at.clone()),
        license: Set(repo.license.clone()),
        stargazers_count: Set(repo.stargazers_count),
        watchers_count: Set(repo.watchers_count),
        forks_count: Set(repo.forks_count),
        lang: Set(repo.lang.clone()),
        homepage: Set(repo.homepage.clone()),
        size: Set(repo.size),
    }
}

impl From<RepoModel> for Repository {
    fn from(model: RepoModel) -> Self {
        Repository {
            id: model.id,
            full_name: model.full_name,
            description: model.description,
            private: model.private,
            created_at: model.created_at,
            license: model.license,
            pushed_at: model.pushed_at,
            stargazers_count: model.stargazers_count,
            watchers_count: model.watchers_count,
            forks_count: model.forks_count,
            lang: model.lang,
            homepage: model.homepage,
            size: model.size,
        }
    }
}
