//! GitHub API client.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde_json::Value;
use url::Url;

use super::convert::{commit_from_json, release_from_json, user_from_json};
use super::trending::TrendingScraper;
use super::types::{Commit, Release, TrendingEntry, User};
use crate::error::{OmgError, Result};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpMethod, HttpRequest, HttpTransport};

/// Default REST API root.
pub const API_ROOT: &str = "https://api.github.com";

/// Default root for the public web pages (trending).
pub const WEB_ROOT: &str = "https://github.com";

const USER_AGENT: &str = "omg-client/0.1.0";
/// The star media type makes `/user/starred` include `starred_at`.
const ACCEPT: &str = "application/vnd.github.v3.star+json";
const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// GitHub API client.
///
/// Holds no mutable state; clones share the transport.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_root: String,
    web_root: String,
    token: String,
    scraper: TrendingScraper,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_root", &self.api_root)
            .field("web_root", &self.web_root)
            .finish_non_exhaustive()
    }
}

/// Map the `message` of an error-shaped body to an error kind.
pub(crate) fn classify_message(message: &str) -> OmgError {
    if message == "Not Found" {
        OmgError::NotFound(message.to_string())
    } else {
        OmgError::Auth(message.to_string())
    }
}

/// Human-readable text for a failed response: its JSON `message` if it has
/// one, else the raw body.
fn error_text(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| OmgError::Transport(format!("invalid url {raw}: {e}")))
}

impl GitHubClient {
    /// Client with a reqwest transport and a 30 second timeout.
    pub fn new(token: &str) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))?;
        Self::new_with_transport(token, Arc::new(transport))
    }

    pub fn new_with_transport(token: &str, transport: Arc<dyn HttpTransport>) -> Result<Self> {
        Ok(Self {
            transport,
            api_root: API_ROOT.to_string(),
            web_root: WEB_ROOT.to_string(),
            token: token.to_string(),
            scraper: TrendingScraper::new()?,
        })
    }

    #[must_use]
    pub fn with_api_root(mut self, api_root: &str) -> Self {
        self.api_root = api_root.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_web_root(mut self, web_root: &str) -> Self {
        self.web_root = web_root.trim_end_matches('/').to_string();
        self
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn api_request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.api_root, path))
            .header("Authorization", format!("token {}", self.token))
            .header("Content-Type", CONTENT_TYPE)
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
    }

    /// Authenticated API call.
    ///
    /// Returns `None` for 204/304. Any other 2xx body must be JSON.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<Option<Value>> {
        let mut request = self.api_request(method, path);
        if let Some(payload) = payload {
            request = request.body(serde_json::to_vec(payload)?);
        }

        let response = self.transport.send(request).await?;
        match response.status {
            204 | 304 => Ok(None),
            _ if response.is_success() => {
                let value = serde_json::from_slice(&response.body)?;
                Ok(Some(value))
            }
            s => Err(OmgError::from_status(s, error_text(&response.body))),
        }
    }

    /// Profile of `username`, or of the token's owner when absent or empty.
    pub async fn whoami(&self, username: Option<&str>) -> Result<User> {
        let path = match username.filter(|u| !u.is_empty()) {
            Some(user) => format!("/users/{user}"),
            None => "/user".to_string(),
        };

        let body = match self.request(HttpMethod::Get, &path, None).await {
            Ok(body) => body.unwrap_or(Value::Null),
            Err(OmgError::NotFound(_)) => return Err(user_not_found()),
            Err(OmgError::Auth(_)) => return Err(pat_rejected()),
            Err(e) => return Err(e),
        };

        if let Some(message) = body.get("message").and_then(Value::as_str) {
            tracing::warn!(path = %path, message, "whoami refused");
            return Err(match classify_message(message) {
                OmgError::NotFound(_) => user_not_found(),
                _ => pat_rejected(),
            });
        }
        Ok(user_from_json(&body))
    }

    /// Most recent `limit` commits of `full_name`.
    pub async fn list_commits(&self, full_name: &str, limit: usize) -> Result<Vec<Commit>> {
        let path = format!("/repos/{full_name}/commits?per_page={limit}");
        let items = self.fetch_array(&path).await?;
        Ok(items.iter().map(commit_from_json).collect())
    }

    /// Most recent `limit` releases of `full_name`, assets included.
    pub async fn list_releases(&self, full_name: &str, limit: usize) -> Result<Vec<Release>> {
        let path = format!("/repos/{full_name}/releases?per_page={limit}");
        let items = self.fetch_array(&path).await?;
        Ok(items.iter().map(release_from_json).collect())
    }

    /// GET `path` expecting a JSON array. No content is an empty array; an
    /// object carrying `message` is GitHub refusing the request.
    pub(crate) async fn fetch_array(&self, path: &str) -> Result<Vec<Value>> {
        match self.request(HttpMethod::Get, path, None).await? {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => match other.get("message").and_then(Value::as_str) {
                Some(message) => Err(classify_message(message)),
                None => Err(OmgError::decode(format!("expected a JSON array from {path}"))),
            },
        }
    }

    /// Remove the star on `full_name` server side.
    pub async fn unstar_remote(&self, full_name: &str) -> Result<()> {
        let path = format!("/user/starred/{full_name}");
        self.request(HttpMethod::Delete, &path, None).await?;
        Ok(())
    }

    /// Scrape the trending page for `language` over `since`
    /// (`daily`, `weekly`, `monthly`).
    pub async fn trending(&self, language: &str, since: &str) -> Result<Vec<TrendingEntry>> {
        let mut url = parse_url(&format!("{}/trending/{}", self.web_root, language))?;
        url.query_pairs_mut().append_pair("since", since);

        let request = HttpRequest::get(url.as_str())
            .header("X-PJAX", "true")
            .header("User-Agent", USER_AGENT);
        let response = self.transport.send(request).await?;
        if response.status != 200 {
            return Err(OmgError::Transport(format!(
                "get trending url not OK (status {})",
                response.status
            )));
        }

        let html = String::from_utf8_lossy(&response.body);
        let entries = self.scraper.scrape(&html);
        tracing::debug!(language, since, count = entries.len(), "trending scraped");
        Ok(entries)
    }

    /// Stream `url` into `dest`, replacing any existing file.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let request = HttpRequest::get(url).header("User-Agent", USER_AGENT);
        let status = self.transport.download(request, dest).await?;
        if status >= 400 {
            return Err(OmgError::from_status(status, format!("download of {url} failed")));
        }
        Ok(())
    }
}

fn user_not_found() -> OmgError {
    OmgError::NotFound("User Not Found".to_string())
}

fn pat_rejected() -> OmgError {
    OmgError::Auth("GitHub PAT authentication failed".to_string())
}
