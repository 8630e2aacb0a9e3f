//! The page loop: fetch, map, persist, decide whether to continue.
//!
//! Exactly one page request is in flight at a time, and a page is committed
//! before the next one is requested. A failing page ends the sync with that
//! page's error; pages already committed stay committed.

use serde_json::Value;

use super::types::{SyncOptions, SyncResult};
use crate::error::{OmgError, Result};
use crate::github::{
    GitHubClient, PageKind, Repository, Star, repo_from_json, star_from_json,
};
use crate::repository::{Store, UpsertOutcome};

/// Mirror the authenticated user's own repositories.
pub async fn sync_repos(
    client: &GitHubClient,
    store: &Store,
    options: &SyncOptions,
) -> Result<SyncResult> {
    sync_pages(client, store, PageKind::MyRepos, options).await
}

/// Mirror the authenticated user's stars.
pub async fn sync_stars(
    client: &GitHubClient,
    store: &Store,
    options: &SyncOptions,
) -> Result<SyncResult> {
    sync_pages(client, store, PageKind::MyStars, options).await
}

async fn save_page(store: &Store, kind: PageKind, items: &[Value]) -> Result<UpsertOutcome> {
    match kind {
        PageKind::MyRepos => {
            let repos: Vec<Repository> = items.iter().map(repo_from_json).collect();
            store.save_my_repos(&repos).await
        }
        PageKind::MyStars => {
            let mut skipped = Vec::new();
            let stars: Vec<Star> = items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    let star = star_from_json(item);
                    if star.is_none() {
                        tracing::warn!(index, "starred element has no repo object, skipping");
                        skipped.push(format!("element {index}: no repo object"));
                    }
                    star
                })
                .collect();

            let mut outcome = if stars.is_empty() {
                UpsertOutcome::default()
            } else {
                store.save_my_stars(&stars).await?
            };
            outcome.errors.extend(skipped);
            Ok(outcome)
        }
    }
}

async fn sync_pages(
    client: &GitHubClient,
    store: &Store,
    kind: PageKind,
    options: &SyncOptions,
) -> Result<SyncResult> {
    let page_size = options.page_size.max(1);
    let mut result = SyncResult::default();

    for page in 1.. {
        if options.max_pages.is_some_and(|max| result.pages >= max) {
            tracing::debug!(kind = kind.as_str(), pages = result.pages, "page cap reached");
            break;
        }

        let items = client.fetch_page(kind, page_size, page).await?;
        result.pages += 1;
        result.fetched += items.len();

        if !items.is_empty() {
            let outcome = save_page(store, kind, &items).await?;
            result.saved += outcome.saved;
            result.errors.extend(outcome.errors);
        }

        if items.len() < page_size {
            break;
        }
    }

    tracing::info!(
        kind = kind.as_str(),
        pages = result.pages,
        fetched = result.fetched,
        saved = result.saved,
        errors = result.errors.len(),
        "sync complete"
    );
    Ok(result)
}

/// Unstar a repository by id.
///
/// The name is looked up locally, the star is removed on GitHub, and only
/// then is the local marker dropped. The repository row is kept.
pub async fn unstar(client: &GitHubClient, store: &Store, repo_id: i64) -> Result<()> {
    let full_name = store
        .find_full_name(repo_id)
        .await?
        .ok_or_else(|| OmgError::NotFound(format!("repo {repo_id} is not in the local store")))?;

    client.unstar_remote(&full_name).await?;
    store.delete_star(repo_id).await?;

    tracing::info!(repo_id, full_name = %full_name, "unstarred");
    Ok(())
}

#[cfg(all(test, feature = "migrate"))]
mod tests {
    use super::*;
    use crate::http::{HttpMethod, MockTransport};
    use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
    use serde_json::json;
    use std::sync::Arc;

    const API: &str = "https://api.github.com";

    async fn store() -> Store {
        Store::open("sqlite::memory:").await.expect("in-memory store")
    }

    fn client(transport: &MockTransport) -> GitHubClient {
        GitHubClient::new_with_transport("t0ken", Arc::new(transport.clone())).unwrap()
    }

    fn repo_json(id: i64) -> Value {
        json!({
            "id": id,
            "full_name": format!("owner/repo-{id}"),
            "description": format!("repository number {id}"),
            "private": false,
            "created_at": format!("2020-01-01T00:{:02}:{:02}Z", (id / 60) % 60, id % 60),
            "pushed_at": "2024-06-01T12:00:00Z",
            "license": null,
            "stargazers_count": id * 2,
            "watchers_count": id,
            "forks_count": 1,
            "language": "Rust",
            "size": 64
        })
    }

    fn repo_page(first_id: i64, len: usize) -> String {
        let items: Vec<Value> = (0..len as i64).map(|i| repo_json(first_id + i)).collect();
        Value::Array(items).to_string()
    }

    fn star_page(first_id: i64, len: usize, starred_at: &str) -> String {
        let items: Vec<Value> = (0..len as i64)
            .map(|i| json!({ "starred_at": starred_at, "repo": repo_json(first_id + i) }))
            .collect();
        Value::Array(items).to_string()
    }

    fn repos_url(per_page: usize, page: usize) -> String {
        format!("{API}{}", PageKind::MyRepos.page_path(per_page, page))
    }

    fn stars_url(per_page: usize, page: usize) -> String {
        format!("{API}{}", PageKind::MyStars.page_path(per_page, page))
    }

    #[tokio::test]
    async fn short_page_ends_the_sync() {
        let transport = MockTransport::new();
        let mut next_id = 1;
        for (page, len) in [(1, 100), (2, 100), (3, 37)] {
            transport.push_json(
                HttpMethod::Get,
                repos_url(100, page),
                200,
                &repo_page(next_id, len),
            );
            next_id += len as i64;
        }
        let store = store().await;

        let result = sync_repos(&client(&transport), &store, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(transport.requests().len(), 3);
        assert_eq!(result.pages, 3);
        assert_eq!(result.fetched, 237);
        assert_eq!(result.saved, 237);
        assert!(result.errors.is_empty());
        assert_eq!(store.query_repos(None, None).await.unwrap().len(), 237);
    }

    #[tokio::test]
    async fn empty_page_after_full_pages_costs_one_more_request() {
        let transport = MockTransport::new();
        for page in 1..=3 {
            let first = (page as i64 - 1) * 100 + 1;
            transport.push_json(
                HttpMethod::Get,
                repos_url(100, page),
                200,
                &repo_page(first, 100),
            );
        }
        transport.push_json(HttpMethod::Get, repos_url(100, 4), 200, "[]");
        let store = store().await;

        let result = sync_repos(&client(&transport), &store, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(transport.requests().len(), 4);
        assert_eq!(result.pages, 4);
        assert_eq!(result.saved, 300);
    }

    #[tokio::test]
    async fn page_cap_stops_before_a_short_page() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            stars_url(2, 1),
            200,
            &star_page(1, 2, "2024-01-01T00:00:00Z"),
        );
        transport.push_json(
            HttpMethod::Get,
            stars_url(2, 2),
            200,
            &star_page(3, 2, "2024-01-02T00:00:00Z"),
        );
        let store = store().await;
        let options = SyncOptions {
            page_size: 2,
            max_pages: Some(2),
        };

        let result = sync_stars(&client(&transport), &store, &options)
            .await
            .unwrap();

        assert_eq!(transport.requests().len(), 2);
        assert_eq!(result.saved, 4);
        let stars = store.query_stars(None, None).await.unwrap();
        assert_eq!(stars.len(), 4);
        assert!(stars.iter().all(|s| s.starred_at.is_some()));
    }

    #[tokio::test]
    async fn failing_page_keeps_earlier_pages() {
        let transport = MockTransport::new();
        transport.push_json(HttpMethod::Get, repos_url(100, 1), 200, &repo_page(1, 100));
        transport.push_json(
            HttpMethod::Get,
            repos_url(100, 2),
            502,
            r#"{"message":"Server Error"}"#,
        );
        let store = store().await;

        let err = sync_repos(&client(&transport), &store, &SyncOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, OmgError::Api { status: 502, .. }), "got {err:?}");
        assert_eq!(store.query_repos(None, None).await.unwrap().len(), 100);
    }

    #[tokio::test]
    async fn undecodable_page_fails_the_sync() {
        let transport = MockTransport::new();
        transport.push_json(HttpMethod::Get, stars_url(100, 1), 200, "[{\"repo\": ");
        let store = store().await;

        let err = sync_stars(&client(&transport), &store, &SyncOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OmgError::Decode(_)));
    }

    #[tokio::test]
    async fn failing_row_is_reported_and_skipped() {
        let transport = MockTransport::new();
        let mut items: Vec<Value> = (1..=3).map(repo_json).collect();
        items[1]["full_name"] = json!("bad/row");
        transport.push_json(
            HttpMethod::Get,
            repos_url(100, 1),
            200,
            &Value::Array(items).to_string(),
        );
        let store = store().await;
        store
            .connection()
            .execute_unprepared(
                "CREATE TRIGGER reject_bad_row BEFORE INSERT ON omg_repo \
                 WHEN NEW.full_name = 'bad/row' \
                 BEGIN SELECT RAISE(ABORT, 'rejected by test trigger'); END",
            )
            .await
            .unwrap();

        let result = sync_repos(&client(&transport), &store, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(result.fetched, 3);
        assert_eq!(result.saved, 2);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("bad/row"));
        let ids: Vec<i64> = store
            .query_repos(None, None)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains(&2));
    }

    #[tokio::test]
    async fn unstar_removes_marker_but_keeps_repository() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            stars_url(100, 1),
            200,
            &star_page(41, 2, "2024-03-03T03:03:03Z"),
        );
        transport.push_json(
            HttpMethod::Delete,
            format!("{API}/user/starred/owner/repo-41"),
            204,
            "",
        );
        let store = store().await;
        let client = client(&transport);
        sync_stars(&client, &store, &SyncOptions::default()).await.unwrap();

        unstar(&client, &store, 41).await.unwrap();

        let remaining = store.query_stars(None, None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].repo.id, 42);
        assert!(store.find_repo(41).await.unwrap().is_some());
        assert_eq!(
            crate::entity::prelude::MyStar::find()
                .count(store.connection())
                .await
                .unwrap(),
            1
        );

        let last = transport.requests().pop().unwrap();
        assert_eq!(last.method, HttpMethod::Delete);
    }

    #[tokio::test]
    async fn unstar_unknown_id_touches_nothing_remote() {
        let transport = MockTransport::new();
        let store = store().await;

        let err = unstar(&client(&transport), &store, 999).await.unwrap_err();
        assert!(matches!(err, OmgError::NotFound(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn unstar_keeps_marker_when_remote_delete_fails() {
        let transport = MockTransport::new();
        transport.push_json(
            HttpMethod::Get,
            stars_url(100, 1),
            200,
            &star_page(7, 1, "2024-01-01T00:00:00Z"),
        );
        transport.push_json(
            HttpMethod::Delete,
            format!("{API}/user/starred/owner/repo-7"),
            401,
            r#"{"message":"Bad credentials"}"#,
        );
        let store = store().await;
        let client = client(&transport);
        sync_stars(&client, &store, &SyncOptions::default()).await.unwrap();

        let err = unstar(&client, &store, 7).await.unwrap_err();
        assert!(matches!(err, OmgError::Auth(_)));
        assert_eq!(store.query_stars(None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn broken_store_fails_the_sync() {
        let transport = MockTransport::new();
        transport.push_json(HttpMethod::Get, repos_url(100, 1), 200, &repo_page(1, 3));
        let store = store().await;
        for sql in ["DROP VIEW omg_my_repo_view", "DROP TABLE omg_my_repo"] {
            store.connection().execute_unprepared(sql).await.unwrap();
        }

        let err = sync_repos(&client(&transport), &store, &SyncOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, OmgError::Store(_)), "got {err:?}");
        assert_eq!(
            crate::entity::prelude::Repo::find()
                .count(store.connection())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn star_without_repo_is_reported_not_stored() {
        let transport = MockTransport::new();
        let page = json!([
            { "starred_at": "2024-01-01T00:00:00Z", "repo": repo_json(3) },
            { "starred_at": "2024-01-02T00:00:00Z", "repo": null },
        ]);
        transport.push_json(HttpMethod::Get, stars_url(100, 1), 200, &page.to_string());
        let store = store().await;

        let result = sync_stars(&client(&transport), &store, &SyncOptions::default())
            .await
            .unwrap();

        assert_eq!(result.fetched, 2);
        assert_eq!(result.saved, 1);
        assert_eq!(result.errors, vec!["element 1: no repo object".to_string()]);
        assert!(store.find_repo(0).await.unwrap().is_none());
        assert_eq!(store.query_stars(None, None).await.unwrap().len(), 1);
    }
}
