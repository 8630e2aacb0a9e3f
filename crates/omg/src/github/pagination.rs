//! Fetching one page of a paginated listing.

use serde_json::Value;

use super::client::GitHubClient;
use crate::error::Result;

/// GitHub's maximum, and what a normal sync asks for.
pub const PER_PAGE: usize = 100;

/// Which listing a sync walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Repositories the authenticated user owns or collaborates on.
    MyRepos,
    /// Repositories the authenticated user starred.
    MyStars,
}

impl PageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PageKind::MyRepos => "repos",
            PageKind::MyStars => "stars",
        }
    }

    /// Path and query for page `page` (1-based) of `per_page` items.
    pub fn page_path(self, per_page: usize, page: usize) -> String {
        match self {
            PageKind::MyRepos => format!(
                "/user/repos?type=all&per_page={per_page}&page={page}&sort=created"
            ),
            PageKind::MyStars => {
                format!("/user/starred?type=all&per_page={per_page}&page={page}")
            }
        }
    }
}

impl GitHubClient {
    /// Fetch one page and return its raw elements.
    ///
    /// No content counts as an empty page. An object carrying `message` is
    /// GitHub refusing the request; any other non-array is a decode error.
    pub async fn fetch_page(
        &self,
        kind: PageKind,
        per_page: usize,
        page: usize,
    ) -> Result<Vec<Value>> {
        let items = self.fetch_array(&kind.page_path(per_page, page)).await?;
        tracing::debug!(kind = kind.as_str(), page, count = items.len(), "page fetched");
        Ok(items)
    }
}
