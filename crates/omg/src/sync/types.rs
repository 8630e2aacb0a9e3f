use crate::github::PER_PAGE;

/// Pagination settings for one sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Items requested per page. A shorter page ends the sync.
    pub page_size: usize,
    /// Stop after this many pages even if the last one was full.
    pub max_pages: Option<usize>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: PER_PAGE,
            max_pages: None,
        }
    }
}

/// What a sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Pages requested.
    pub pages: usize,
    /// Items received across all pages.
    pub fetched: usize,
    /// Items written to the store.
    pub saved: usize,
    /// Row-level failures (non-fatal).
    pub errors: Vec<String>,
}
