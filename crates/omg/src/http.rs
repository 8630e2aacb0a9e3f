//! HTTP boundary: request/response values, the transport trait, and the
//! reqwest-backed implementation.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

mod buffer;

pub use buffer::ResponseBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Header name/value pairs in the order they were added.
///
/// Lookups through [`header_get`] ignore ASCII case.
pub type HttpHeaders = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("out of memory growing response buffer ({buffered} bytes held, {requested} more requested)")]
    OutOfMemory { requested: usize, buffered: usize },

    #[error("cannot write {path}: {message}")]
    File { path: String, message: String },

    #[error("no mock response registered for {method} {url}")]
    NoMockResponse { method: String, url: String },
}

impl HttpError {
    fn file(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::File {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Transport boundary for all HTTP I/O.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform one request and buffer the whole body.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;

    /// Perform one request, following redirects, and stream the body into
    /// `dest` (created or truncated). Returns the final status code.
    async fn download(&self, request: HttpRequest, dest: &Path) -> Result<u16, HttpError>;
}

/// First header value matching `name` (case-insensitive).
#[must_use]
pub fn header_get<'a>(headers: &'a HttpHeaders, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

pub mod reqwest_transport {
    use super::*;

    use std::time::Duration as StdDuration;

    use tokio::io::AsyncWriteExt;

    fn transport_err(e: reqwest::Error) -> HttpError {
        HttpError::Transport(e.to_string())
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// A real HTTP transport backed by reqwest.
    ///
    /// API calls share one pooled client. Downloads build a throwaway client
    /// so a long transfer never holds a pooled connection.
    #[derive(Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
        timeout: Option<StdDuration>,
        max_body_bytes: Option<usize>,
    }

    impl ReqwestTransport {
        pub fn new(client: reqwest::Client) -> Self {
            Self {
                client,
                timeout: None,
                max_body_bytes: None,
            }
        }

        pub fn with_timeout(timeout: StdDuration) -> Result<Self, HttpError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(transport_err)?;
            Ok(Self {
                client,
                timeout: Some(timeout),
                max_body_bytes: None,
            })
        }

        /// Refuse buffered bodies larger than `limit` bytes.
        #[must_use]
        pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
            self.max_body_bytes = Some(limit);
            self
        }

        fn buffer(&self) -> ResponseBuffer {
            match self.max_body_bytes {
                Some(limit) => ResponseBuffer::with_limit(limit),
                None => ResponseBuffer::new(),
            }
        }

        fn download_client(&self) -> Result<reqwest::Client, HttpError> {
            let mut builder =
                reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(10));
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }
            builder.build().map_err(transport_err)
        }
    }

    fn headers_of(resp: &reqwest::Response) -> HttpHeaders {
        resp.headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[async_trait]
    impl HttpTransport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
            let mut builder = self.client.request(method(request.method), &request.url);
            for (k, v) in &request.headers {
                builder = builder.header(k, v);
            }
            if !request.body.is_empty() {
                builder = builder.body(request.body);
            }

            let mut resp = builder.send().await.map_err(transport_err)?;
            let status = resp.status().as_u16();
            let headers = headers_of(&resp);

            let mut body = self.buffer();
            while let Some(chunk) = resp.chunk().await.map_err(transport_err)? {
                body.append(&chunk)?;
            }
            tracing::debug!(
                url = %request.url,
                status,
                bytes = body.len(),
                "response buffered"
            );

            Ok(HttpResponse {
                status,
                headers,
                body: body.into_bytes(),
            })
        }

        async fn download(&self, request: HttpRequest, dest: &Path) -> Result<u16, HttpError> {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| HttpError::file(dest, e))?;

            let client = self.download_client()?;
            let mut builder = client.request(method(request.method), &request.url);
            for (k, v) in &request.headers {
                builder = builder.header(k, v);
            }

            let mut resp = builder.send().await.map_err(transport_err)?;
            let status = resp.status().as_u16();

            while let Some(chunk) = resp.chunk().await.map_err(transport_err)? {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| HttpError::file(dest, e))?;
            }
            file.flush().await.map_err(|e| HttpError::file(dest, e))?;

            tracing::debug!(
                url = %request.url,
                status,
                dest = %dest.display(),
                "download finished"
            );
            Ok(status)
        }
    }
}

// ---------- Test-only mock transport ----------

#[cfg(test)]
use std::collections::{HashMap, VecDeque};
#[cfg(test)]
use std::sync::{Arc, Mutex};

/// In-memory transport for unit tests: no sockets, no loopback servers.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[cfg(test)]
#[derive(Default)]
struct MockTransportInner {
    routes: HashMap<(HttpMethod, String), VecDeque<HttpResponse>>,
    requests: Vec<HttpRequest>,
}

#[cfg(test)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for a method + URL. Responses registered under
    /// the same key are returned in FIFO order.
    pub fn push_response(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        response: HttpResponse,
    ) {
        let mut inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        inner
            .routes
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    /// Shorthand for a JSON response with the given status.
    pub fn push_json(&self, method: HttpMethod, url: impl Into<String>, status: u16, body: &str) {
        self.push_response(
            method,
            url,
            HttpResponse {
                status,
                headers: vec![("Content-Type".to_string(), "application/json".to_string())],
                body: body.as_bytes().to_vec(),
            },
        );
    }

    #[must_use]
    pub fn requests(&self) -> Vec<HttpRequest> {
        let inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");
        inner.requests.clone()
    }

    fn next(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut inner = self
            .inner
            .lock()
            .expect("mock transport lock should not be poisoned");

        let key = (request.method, request.url.clone());
        inner.requests.push(request);

        match inner.routes.get_mut(&key).and_then(|q| q.pop_front()) {
            Some(resp) => Ok(resp),
            None => Err(HttpError::NoMockResponse {
                method: key.0.as_str().to_string(),
                url: key.1,
            }),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.next(request)
    }

    async fn download(&self, request: HttpRequest, dest: &Path) -> Result<u16, HttpError> {
        let resp = self.next(request)?;
        tokio::fs::write(dest, &resp.body)
            .await
            .map_err(|e| HttpError::file(dest, e))?;
        Ok(resp.status)
    }
}
