//! Filtered reads over the two read views.

use futures::StreamExt;
use futures::stream::BoxStream;
use sea_orm::{ConnectionTrait, DbBackend, QueryResult, Statement, StreamTrait};

use super::Store;
use crate::error::{OmgError, Result};
use crate::github::{PageKind, Repository, Star};

/// Default ceiling on the composed SQL text, in bytes.
pub const SQL_CAPACITY: usize = 512;

/// Repository columns, in the same order the write path maps them.
const REPO_COLUMNS: &str = "id,full_name,description,private,\
     datetime(created_at, 'localtime'),license,datetime(pushed_at, 'localtime'),\
     stargazers_count,watchers_count,forks_count,lang,homepage,`size`";

/// Index of the first repository column in every row.
const REPO_OFFSET: usize = 1;

/// Builds the read query into a fixed-capacity buffer.
///
/// Every append is checked against the ceiling; crossing it fails with
/// [`OmgError::BufferTooSmall`] rather than truncating or growing.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    sql: String,
    capacity: usize,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::with_capacity(SQL_CAPACITY)
    }
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sql: String::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, step: &'static str, text: &str) -> Result<()> {
        let needed = self.sql.len() + text.len();
        if needed > self.capacity {
            return Err(OmgError::BufferTooSmall {
                capacity: self.capacity,
                needed,
                step,
            });
        }
        self.sql.push_str(text);
        Ok(())
    }

    /// SQL selecting `kind`'s rows, newest first. Empty filters count as absent.
    pub fn build(
        mut self,
        kind: PageKind,
        keyword: Option<&str>,
        language: Option<&str>,
    ) -> Result<String> {
        let (first, view, order) = match kind {
            PageKind::MyStars => (
                "datetime(starred_at, 'localtime') as starred_at",
                "omg_my_star_view",
                "starred_at",
            ),
            PageKind::MyRepos => ("1", "omg_my_repo_view", "created_at"),
        };

        self.push(
            "select",
            &format!("select {first},{REPO_COLUMNS} from {view} where 1"),
        )?;

        if let Some(keyword) = keyword.filter(|k| !k.is_empty()) {
            let keyword = quote(keyword);
            self.push(
                "keyword",
                &format!(
                    " and (full_name like '%{keyword}%' COLLATE NOCASE \
                     or description like '%{keyword}%' COLLATE NOCASE)"
                ),
            )?;
        }

        if let Some(language) = language.filter(|l| !l.is_empty()) {
            self.push(
                "language",
                &format!(" and lang='{}' COLLATE NOCASE", quote(language)),
            )?;
        }

        self.push("order", &format!(" order by {order} desc"))?;
        Ok(self.sql)
    }
}

/// Escape a value for a single-quoted SQL literal.
fn quote(value: &str) -> String {
    value.replace('\'', "''")
}

fn repo_from_row(row: &QueryResult) -> std::result::Result<Repository, sea_orm::DbErr> {
    let col = |i: usize| REPO_OFFSET + i;
    Ok(Repository {
        id: row.try_get_by_index(col(0))?,
        full_name: row.try_get_by_index(col(1))?,
        description: row.try_get_by_index(col(2))?,
        private: row.try_get_by_index(col(3))?,
        created_at: row.try_get_by_index(col(4))?,
        license: row.try_get_by_index(col(5))?,
        pushed_at: row.try_get_by_index(col(6))?,
        stargazers_count: row.try_get_by_index(col(7))?,
        watchers_count: row.try_get_by_index(col(8))?,
        forks_count: row.try_get_by_index(col(9))?,
        lang: row.try_get_by_index(col(10))?,
        homepage: row.try_get_by_index(col(11))?,
        size: row.try_get_by_index(col(12))?,
    })
}

fn star_from_row(row: &QueryResult) -> std::result::Result<Star, sea_orm::DbErr> {
    Ok(Star {
        starred_at: row.try_get_by_index(0)?,
        repo: repo_from_row(row)?,
    })
}

fn statement(kind: PageKind, keyword: Option<&str>, language: Option<&str>) -> Result<Statement> {
    let sql = QueryBuilder::new().build(kind, keyword, language)?;
    tracing::debug!(kind = kind.as_str(), sql = %sql, "querying local mirror");
    Ok(Statement::from_string(DbBackend::Sqlite, sql))
}

impl Store {
    /// Own repositories matching the filters, newest first.
    pub async fn query_repos(
        &self,
        keyword: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<Repository>> {
        let stmt = statement(PageKind::MyRepos, keyword, language)?;
        let rows = self.db.query_all(stmt).await?;
        rows.iter()
            .map(|row| repo_from_row(row).map_err(OmgError::from))
            .collect()
    }

    /// Stars matching the filters, most recently starred first.
    pub async fn query_stars(
        &self,
        keyword: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<Star>> {
        let stmt = statement(PageKind::MyStars, keyword, language)?;
        let rows = self.db.query_all(stmt).await?;
        rows.iter()
            .map(|row| star_from_row(row).map_err(OmgError::from))
            .collect()
    }

    /// Like [`Store::query_repos`], but rows are decoded as they are pulled.
    pub async fn stream_repos(
        &self,
        keyword: Option<&str>,
        language: Option<&str>,
    ) -> Result<BoxStream<'_, Result<Repository>>> {
        let stmt = statement(PageKind::MyRepos, keyword, language)?;
        let rows = self.db.stream(stmt).await?;
        Ok(rows
            .map(|row| -> Result<Repository> { Ok(repo_from_row(&row?)?) })
            .boxed())
    }

    /// Like [`Store::query_stars`], but rows are decoded as they are pulled.
    pub async fn stream_stars(
        &self,
        keyword: Option<&str>,
        language: Option<&str>,
    ) -> Result<BoxStream<'_, Result<Star>>> {
        let stmt = statement(PageKind::MyStars, keyword, language)?;
        let rows = self.db.stream(stmt).await?;
        Ok(rows
            .map(|row| -> Result<Star> { Ok(star_from_row(&row?)?) })
            .boxed())
    }
}
